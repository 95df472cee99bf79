use super::decoder::decode_envelope;
use crate::audio::PlaybackScheduler;
use crate::error::RelayResult;
use crate::protocol::{GenerateRequest, ReplyTimings};
use std::sync::Arc;
use tracing::{info, warn};

/// Client for a relay server's `/generate` endpoint
pub struct VoiceClient {
    server_url: String,
    http: reqwest::Client,
    playback: Arc<PlaybackScheduler>,
}

impl VoiceClient {
    pub fn new(server_url: impl Into<String>, playback: Arc<PlaybackScheduler>) -> Self {
        Self {
            server_url: server_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            playback,
        }
    }

    /// Send one request, play its audio, and return the reply text and word timings.
    ///
    /// Returns only after playback of this reply has finished or been stopped.
    /// A playback failure is logged and does not fail the exchange.
    pub async fn generate(&self, request: &GenerateRequest) -> RelayResult<ReplyTimings> {
        let url = format!("{}/generate", self.server_url);
        info!("Sending request to {}", url);

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        self.playback.start().await;

        let reply = decode_envelope(response.bytes_stream(), &*self.playback).await;

        self.playback.finish();
        match self.playback.join().await {
            Ok(report) => info!("Playback complete ({} chunks)", report.chunks_played),
            Err(e) => warn!("Playback ended early: {}", e),
        }

        reply
    }

    /// Halt playback and drop anything still queued
    pub fn stop_playback(&self) {
        self.playback.stop();
    }

    pub fn playback(&self) -> &Arc<PlaybackScheduler> {
        &self.playback
    }
}

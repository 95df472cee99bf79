use super::client::{FragmentStream, SpeechSynthesis, VoiceParams};
use crate::error::{RelayError, RelayResult};
use crate::timing::CharacterAlignment;
use base64::Engine;
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, info};

/// Fully accumulated synthesis result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynthesizedSpeech {
    /// Concatenated encoded audio (e.g. MP3 frames)
    pub audio: Vec<u8>,
    pub alignment: CharacterAlignment,
}

/// Drives a synthesis backend and flattens its fragment stream
pub struct SpeechSynthesisOrchestrator {
    backend: Arc<dyn SpeechSynthesis>,
    default_voice_id: String,
}

impl SpeechSynthesisOrchestrator {
    pub fn new(backend: Arc<dyn SpeechSynthesis>, default_voice_id: impl Into<String>) -> Self {
        Self {
            backend,
            default_voice_id: default_voice_id.into(),
        }
    }

    pub async fn synthesize(&self, text: &str, params: &VoiceParams) -> RelayResult<SynthesizedSpeech> {
        let voice_id = params
            .voice_id
            .as_deref()
            .unwrap_or(&self.default_voice_id);

        info!(
            "Synthesizing {} chars with voice {}",
            text.chars().count(),
            voice_id
        );

        let fragments = self
            .backend
            .stream_with_timestamps(text, voice_id, params)
            .await?;

        let speech = accumulate(fragments).await?;

        info!(
            "Synthesis complete: {} audio bytes, {} aligned characters",
            speech.audio.len(),
            speech.alignment.len()
        );

        Ok(speech)
    }
}

/// Concatenate audio and alignment from every fragment, in arrival order.
///
/// Time ranges are trusted as delivered; nothing is reordered or deduplicated.
pub async fn accumulate(mut fragments: FragmentStream) -> RelayResult<SynthesizedSpeech> {
    let mut speech = SynthesizedSpeech::default();
    let mut count = 0usize;

    while let Some(fragment) = fragments.next().await {
        let fragment = fragment?;
        count += 1;

        if let Some(audio) = fragment.audio_base64 {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(audio.as_bytes())
                .map_err(|e| RelayError::Synthesis(format!("fragment {}: bad audio: {}", count, e)))?;
            speech.audio.extend_from_slice(&bytes);
        }

        if let Some(alignment) = fragment.alignment {
            if !alignment.is_consistent() {
                return Err(RelayError::Synthesis(format!(
                    "fragment {}: alignment arrays differ in length",
                    count
                )));
            }
            speech.alignment.extend(alignment);
        }
    }

    debug!(fragments = count, "Synthesis stream exhausted");

    Ok(speech)
}

use crate::config::TtsConfig;
use crate::error::{RelayError, RelayResult};
use crate::timing::CharacterAlignment;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info};

/// Lazily produced synthesis fragments
pub type FragmentStream = BoxStream<'static, RelayResult<SynthesisFragment>>;

/// Voice selection and settings for one synthesis call
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceParams {
    /// `None` selects the configured default voice
    pub voice_id: Option<String>,
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

/// One unit of a streamed synthesis response; either half may be absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynthesisFragment {
    #[serde(default)]
    pub audio_base64: Option<String>,

    #[serde(default)]
    pub alignment: Option<CharacterAlignment>,
}

/// Streams synthesized speech together with character alignment
#[async_trait]
pub trait SpeechSynthesis: Send + Sync {
    async fn stream_with_timestamps(
        &self,
        text: &str,
        voice_id: &str,
        params: &VoiceParams,
    ) -> RelayResult<FragmentStream>;
}

#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

/// ElevenLabs `stream/with-timestamps` client
pub struct ElevenLabsClient {
    api_base: String,
    api_key: String,
    model_id: String,
    output_format: String,
    client: reqwest::Client,
}

impl ElevenLabsClient {
    pub fn new(config: &TtsConfig) -> RelayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!(
            "Speech backend: {} (model {}, format {})",
            config.api_base, config.model_id, config.output_format
        );

        Ok(Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model_id: config.model_id.clone(),
            output_format: config.output_format.clone(),
            client,
        })
    }

    pub fn stream_url(&self, voice_id: &str) -> String {
        format!(
            "{}/v1/text-to-speech/{}/stream/with-timestamps?output_format={}",
            self.api_base, voice_id, self.output_format
        )
    }
}

#[async_trait]
impl SpeechSynthesis for ElevenLabsClient {
    async fn stream_with_timestamps(
        &self,
        text: &str,
        voice_id: &str,
        params: &VoiceParams,
    ) -> RelayResult<FragmentStream> {
        let body = SynthesisRequest {
            text,
            model_id: &self.model_id,
            voice_settings: VoiceSettings {
                stability: params.stability,
                similarity_boost: params.similarity_boost,
                style: params.style,
                use_speaker_boost: params.use_speaker_boost,
            },
        };

        debug!(voice_id, text_len = text.len(), "Starting synthesis stream");

        let res = self
            .client
            .post(self.stream_url(voice_id))
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(RelayError::Synthesis(format!("API error {}: {}", status, body)));
        }

        Ok(ndjson_fragments(res.bytes_stream()))
    }
}

struct LineState<B, E> {
    body: BoxStream<'static, Result<B, E>>,
    buffer: Vec<u8>,
    ready: VecDeque<Vec<u8>>,
    done: bool,
}

/// Split a byte stream into newline-delimited JSON fragments.
///
/// Blank lines are skipped. A final line without a trailing newline is still
/// parsed once the body ends.
pub fn ndjson_fragments<S, B, E>(body: S) -> FragmentStream
where
    S: futures::Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<RelayError> + Send + 'static,
{
    let state = LineState {
        body: body.boxed(),
        buffer: Vec::new(),
        ready: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(line) = state.ready.pop_front() {
                let parsed = serde_json::from_slice::<SynthesisFragment>(&line).map_err(|e| {
                    RelayError::Synthesis(format!("invalid fragment: {}", e))
                });
                return Some((parsed, state));
            }

            if state.done {
                return None;
            }

            match state.body.next().await {
                Some(Ok(bytes)) => {
                    state.buffer.extend_from_slice(bytes.as_ref());
                    while let Some(pos) = state.buffer.iter().position(|&b| b == b'\n') {
                        let line: Vec<u8> = state.buffer.drain(..=pos).collect();
                        push_line(&mut state.ready, line);
                    }
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(e.into()), state));
                }
                None => {
                    state.done = true;
                    let rest = std::mem::take(&mut state.buffer);
                    push_line(&mut state.ready, rest);
                }
            }
        }
    })
    .boxed()
}

fn push_line(ready: &mut VecDeque<Vec<u8>>, line: Vec<u8>) {
    if !line.iter().all(u8::is_ascii_whitespace) {
        ready.push_back(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    fn body(parts: &[&str]) -> impl futures::Stream<Item = Result<Vec<u8>, RelayError>> + Send + Unpin {
        let parts: Vec<Result<Vec<u8>, RelayError>> =
            parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        stream::iter(parts)
    }

    #[tokio::test]
    async fn splits_lines_across_chunk_boundaries() {
        let fragments: Vec<SynthesisFragment> = ndjson_fragments(body(&[
            r#"{"audio_base64":"AAA=","alignment":{"characters":["h"],"#,
            r#""character_start_times_seconds":[0.0],"character_end_times_seconds":[0.1]}}"#,
            "\n\n",
            r#"{"audio_base64":null,"alignment":null}"#,
        ]))
        .try_collect()
        .await
        .unwrap();

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].audio_base64.as_deref(), Some("AAA="));
        assert_eq!(fragments[0].alignment.as_ref().unwrap().characters, vec!["h"]);
        assert_eq!(fragments[1], SynthesisFragment::default());
    }

    #[tokio::test]
    async fn rejects_invalid_line() {
        let result: RelayResult<Vec<SynthesisFragment>> =
            ndjson_fragments(body(&["not json\n"])).try_collect().await;

        assert!(matches!(result, Err(RelayError::Synthesis(_))));
    }

    #[test]
    fn url_targets_voice_and_format() {
        let cfg = TtsConfig {
            api_base: "https://api.elevenlabs.io/".to_string(),
            api_key: "key".to_string(),
            default_voice_id: "v".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            output_format: "mp3_44100_128".to_string(),
            timeout_secs: 5,
        };
        let client = ElevenLabsClient::new(&cfg).unwrap();

        assert_eq!(
            client.stream_url("542jzeOaLKbcpZhWfJDa"),
            "https://api.elevenlabs.io/v1/text-to-speech/542jzeOaLKbcpZhWfJDa/stream/with-timestamps?output_format=mp3_44100_128"
        );
    }
}

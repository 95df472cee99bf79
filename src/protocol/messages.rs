use crate::timing::WordTimings;
use serde::{Deserialize, Serialize};

/// Client request to `POST /generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub text: String,

    /// 0: none, 1: mild, 2: moderate, 3: high
    #[serde(default)]
    pub profanity_level: i32,

    #[serde(default)]
    pub session_id: Option<String>,

    /// Falls back to the server's default voice
    #[serde(default)]
    pub voice_id: Option<String>,

    #[serde(default)]
    pub stability: f32,

    #[serde(default)]
    pub similarity_boost: f32,

    #[serde(default)]
    pub style: f32,

    #[serde(default = "default_speaker_boost")]
    pub use_speaker_boost: bool,
}

fn default_speaker_boost() -> bool {
    true
}

impl GenerateRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            profanity_level: 0,
            session_id: None,
            voice_id: None,
            stability: 0.0,
            similarity_boost: 0.0,
            style: 0.0,
            use_speaker_boost: true,
        }
    }
}

/// The single JSON document returned for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub text_response: String,

    /// Base64 of the concatenated synthesized audio
    pub audio_base64: String,

    #[serde(flatten)]
    pub timings: WordTimings,
}

/// What the client hands back once the envelope is parsed (audio goes to playback)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyTimings {
    pub text_response: String,

    #[serde(flatten)]
    pub timings: WordTimings,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

//! Error types for the voice relay

use thiserror::Error;

/// Result type alias for relay operations
pub type RelayResult<T> = Result<T, RelayError>;

/// Errors that can occur on either side of the relay
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Chat completion failed: {0}")]
    Chat(String),

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The body ended before a complete envelope could be parsed
    #[error("Response ended without a complete envelope ({buffered} bytes buffered): {reason}")]
    DecodeIncomplete { buffered: usize, reason: String },

    #[error("Malformed response envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Audio decode error: {0}")]
    AudioDecode(String),

    #[error("Audio output error: {0}")]
    Output(String),

    #[error("Playback task failed: {0}")]
    PlaybackTask(String),
}

impl From<symphonia::core::errors::Error> for RelayError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        RelayError::AudioDecode(err.to_string())
    }
}

impl From<hound::Error> for RelayError {
    fn from(err: hound::Error) -> Self {
        RelayError::Output(err.to_string())
    }
}

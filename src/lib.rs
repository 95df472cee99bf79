pub mod audio;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod llm;
pub mod protocol;
pub mod session;
pub mod timing;
pub mod tts;

pub use audio::{
    AudioChunk, AudioOutput, ChunkSink, PcmBuffer, PlaybackConfig, PlaybackReport,
    PlaybackScheduler, WavFileOutput,
};
pub use client::VoiceClient;
pub use config::Config;
pub use error::{RelayError, RelayResult};
pub use http::{create_router, AppState};
pub use llm::{ChatCompletion, ChatTurn, OpenAiChat, Role};
pub use protocol::{GenerateRequest, ReplyTimings, ResponseEnvelope};
pub use session::{Conversation, InMemorySessionStore, SessionStore};
pub use timing::{aggregate, CharacterAlignment, WordTimings};
pub use tts::{ElevenLabsClient, SpeechSynthesis, SpeechSynthesisOrchestrator, VoiceParams};

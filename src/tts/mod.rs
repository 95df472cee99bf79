//! Text-to-speech with per-character alignment
//!
//! - `client`: the `SpeechSynthesis` trait and the ElevenLabs streaming client
//! - `orchestrator`: folds the fragment stream into one audio buffer and one alignment

pub mod client;
pub mod orchestrator;

pub use client::{ElevenLabsClient, FragmentStream, SpeechSynthesis, SynthesisFragment, VoiceParams};
pub use orchestrator::{SpeechSynthesisOrchestrator, SynthesizedSpeech};

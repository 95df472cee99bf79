//! Relay client: posts a request, decodes the streamed envelope and plays its audio
//!
//! - `decoder`: accumulate-and-parse of the chunked response body
//! - `relay`: `VoiceClient`, which ties the decoder to a `PlaybackScheduler`

pub mod decoder;
pub mod relay;

pub use decoder::decode_envelope;
pub use relay::VoiceClient;

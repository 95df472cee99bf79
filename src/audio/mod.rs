pub mod decode;
pub mod output;
pub mod playback;

pub use decode::{decode_chunk, PcmBuffer};
pub use output::{AudioOutput, WavFileOutput};
pub use playback::{AudioChunk, ChunkSink, PlaybackConfig, PlaybackReport, PlaybackScheduler};

#[cfg(feature = "speaker")]
pub use output::SpeakerOutput;

use super::decode::PcmBuffer;
use crate::error::{RelayError, RelayResult};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

/// Audio output device
///
/// Implementations:
/// - `WavFileOutput`: appends everything played to a WAV file
/// - `SpeakerOutput`: default sound device via rodio (`speaker` feature)
pub trait AudioOutput: Send + Sync {
    /// Begin rendering a buffer
    fn play(&self, buffer: &PcmBuffer) -> RelayResult<()>;

    /// Block until everything handed to `play` has been rendered
    fn wait(&self);

    /// Halt immediately, dropping anything not yet rendered
    fn stop(&self);

    /// Get output name for logging
    fn name(&self) -> &str;
}

/// Writes played audio to a 16-bit WAV file
///
/// The first buffer fixes the file's rate and channel count.
pub struct WavFileOutput {
    path: PathBuf,
    writer: Mutex<Option<WavWriter<BufWriter<File>>>>,
}

impl WavFileOutput {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            writer: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and close the file
    pub fn finalize(&self) -> RelayResult<()> {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(writer) = writer.take() {
            writer.finalize()?;
            info!("Finalized WAV output: {}", self.path.display());
        }
        Ok(())
    }
}

impl AudioOutput for WavFileOutput {
    fn play(&self, buffer: &PcmBuffer) -> RelayResult<()> {
        let mut guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());

        if guard.is_none() {
            let spec = WavSpec {
                channels: buffer.channels,
                sample_rate: buffer.sample_rate,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            };
            *guard = Some(WavWriter::create(&self.path, spec)?);
            info!(
                "Writing audio to {} ({}Hz, {} channels)",
                self.path.display(),
                buffer.sample_rate,
                buffer.channels
            );
        }

        let writer = guard
            .as_mut()
            .ok_or_else(|| RelayError::Output("WAV writer unavailable".to_string()))?;

        let spec = writer.spec();
        if spec.sample_rate != buffer.sample_rate || spec.channels != buffer.channels {
            return Err(RelayError::Output(format!(
                "buffer is {}Hz/{}ch but {} is {}Hz/{}ch",
                buffer.sample_rate,
                buffer.channels,
                self.path.display(),
                spec.sample_rate,
                spec.channels
            )));
        }

        for &sample in &buffer.samples {
            let scaled = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
            writer.write_sample(scaled)?;
        }

        Ok(())
    }

    fn wait(&self) {
        // Writes complete synchronously inside `play`
    }

    fn stop(&self) {
        if let Err(e) = self.finalize() {
            tracing::error!("Failed to finalize WAV output: {}", e);
        }
    }

    fn name(&self) -> &str {
        "wav-file"
    }
}

#[cfg(feature = "speaker")]
pub use speaker::SpeakerOutput;

#[cfg(feature = "speaker")]
mod speaker {
    use super::{AudioOutput, PcmBuffer};
    use crate::error::{RelayError, RelayResult};
    use rodio::buffer::SamplesBuffer;
    use rodio::{OutputStream, Sink};
    use std::sync::mpsc;
    use tracing::info;

    /// Plays through the default output device
    pub struct SpeakerOutput {
        sink: Sink,
        // Dropping this lets the thread that owns the OutputStream exit
        _keepalive: mpsc::Sender<()>,
    }

    impl SpeakerOutput {
        pub fn new() -> RelayResult<Self> {
            let (handle_tx, handle_rx) = mpsc::channel();
            let (keepalive, shutdown) = mpsc::channel::<()>();

            // OutputStream is not Send, so it lives on its own thread
            std::thread::Builder::new()
                .name("audio-output".to_string())
                .spawn(move || match OutputStream::try_default() {
                    Ok((_stream, handle)) => {
                        let _ = handle_tx.send(Ok(handle));
                        let _ = shutdown.recv();
                    }
                    Err(e) => {
                        let _ = handle_tx.send(Err(e.to_string()));
                    }
                })
                .map_err(|e| RelayError::Output(e.to_string()))?;

            let handle = handle_rx
                .recv()
                .map_err(|e| RelayError::Output(e.to_string()))?
                .map_err(RelayError::Output)?;

            let sink = Sink::try_new(&handle).map_err(|e| RelayError::Output(e.to_string()))?;
            info!("Speaker output ready");

            Ok(Self {
                sink,
                _keepalive: keepalive,
            })
        }
    }

    impl AudioOutput for SpeakerOutput {
        fn play(&self, buffer: &PcmBuffer) -> RelayResult<()> {
            self.sink.append(SamplesBuffer::new(
                buffer.channels,
                buffer.sample_rate,
                buffer.samples.clone(),
            ));
            self.sink.play();
            Ok(())
        }

        fn wait(&self) {
            self.sink.sleep_until_end();
        }

        fn stop(&self) {
            self.sink.stop();
        }

        fn name(&self) -> &str {
            "speaker"
        }
    }
}

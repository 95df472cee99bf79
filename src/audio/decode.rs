use crate::error::{RelayError, RelayResult};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Decoded audio (f32 in [-1, 1], interleaved)
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmBuffer {
    /// Number of sample frames (one sample per channel)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Duplicate mono samples across `target_channels`; other layouts pass through
    pub fn upmix(self, target_channels: u16) -> Self {
        if self.channels != 1 || target_channels <= 1 {
            return self;
        }

        let fan_out = target_channels as usize;
        let mut samples = Vec::with_capacity(self.samples.len() * fan_out);
        for sample in self.samples {
            samples.extend(std::iter::repeat(sample).take(fan_out));
        }

        Self {
            samples,
            sample_rate: self.sample_rate,
            channels: target_channels,
        }
    }
}

/// Decode one encoded audio chunk (MP3, WAV, ...) into normalized PCM
pub fn decode_chunk(bytes: &[u8]) -> RelayResult<PcmBuffer> {
    let source = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let probed = symphonia::default::get_probe().format(
        &Hint::new(),
        source,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| RelayError::AudioDecode("no decodable audio track".to_string()))?;
    let track_id = track.id;

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples = Vec::new();
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(0);

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(msg)) => {
                warn!("Skipping corrupt audio frame: {}", msg);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        channels = spec.channels.count() as u16;

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buffer.samples());
    }

    if samples.is_empty() || channels == 0 || sample_rate == 0 {
        return Err(RelayError::AudioDecode("chunk contained no audio frames".to_string()));
    }

    let pcm = PcmBuffer {
        samples,
        sample_rate,
        channels,
    };

    debug!(
        "Decoded chunk: {:.2}s, {}Hz, {} channels",
        pcm.duration_seconds(),
        pcm.sample_rate,
        pcm.channels
    );

    Ok(pcm)
}

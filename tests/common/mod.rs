// Shared fakes and fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine;
use futures::stream::{self, StreamExt};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use voice_relay::llm::{ChatCompletion, ChatTurn};
use voice_relay::tts::{FragmentStream, SpeechSynthesis, SynthesisFragment, VoiceParams};
use voice_relay::{AudioOutput, CharacterAlignment, PcmBuffer, RelayError, RelayResult};

/// Encode 16-bit samples as an in-memory WAV file
pub fn wav_bytes(samples: &[i16], channels: u16, sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Per-character alignment for `text`, 0.1s per character
pub fn alignment_for(text: &str, offset: f64) -> CharacterAlignment {
    let n = text.chars().count();
    CharacterAlignment {
        characters: text.chars().map(String::from).collect(),
        character_start_times_seconds: (0..n).map(|i| offset + i as f64 * 0.1).collect(),
        character_end_times_seconds: (0..n).map(|i| offset + (i + 1) as f64 * 0.1).collect(),
    }
}

/// Output device that records what it was asked to play
#[derive(Default)]
pub struct RecordingOutput {
    pub played: Mutex<Vec<PcmBuffer>>,
    pub stops: Mutex<usize>,
    /// How long `wait` blocks, standing in for render time
    pub render_time: Duration,
}

impl RecordingOutput {
    pub fn with_render_time(render_time: Duration) -> Self {
        Self {
            render_time,
            ..Default::default()
        }
    }

    pub fn played(&self) -> Vec<PcmBuffer> {
        self.played.lock().unwrap().clone()
    }

    pub fn stop_count(&self) -> usize {
        *self.stops.lock().unwrap()
    }
}

impl AudioOutput for RecordingOutput {
    fn play(&self, buffer: &PcmBuffer) -> RelayResult<()> {
        self.played.lock().unwrap().push(buffer.clone());
        Ok(())
    }

    fn wait(&self) {
        if !self.render_time.is_zero() {
            std::thread::sleep(self.render_time);
        }
    }

    fn stop(&self) {
        *self.stops.lock().unwrap() += 1;
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Chat backend that replies from a script and records what it was sent
pub struct ScriptedChat {
    pub replies: Mutex<Vec<String>>,
    pub calls: Mutex<Vec<(String, Vec<ChatTurn>, String)>>,
}

impl ScriptedChat {
    pub fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ChatCompletion for ScriptedChat {
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatTurn],
        user_text: &str,
    ) -> RelayResult<String> {
        self.calls.lock().unwrap().push((
            system_prompt.to_string(),
            history.to_vec(),
            user_text.to_string(),
        ));
        self.replies
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| RelayError::Chat("script exhausted".to_string()))
    }
}

/// Speech backend that returns the reply's alignment in two fragments and
/// a fixed WAV as audio, split across fragments
pub struct ScriptedSpeech {
    pub audio: Vec<u8>,
    pub voices: Mutex<Vec<String>>,
    pub fail: bool,
}

impl ScriptedSpeech {
    pub fn new(audio: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            audio,
            voices: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            audio: Vec::new(),
            voices: Mutex::new(Vec::new()),
            fail: true,
        })
    }
}

#[async_trait]
impl SpeechSynthesis for ScriptedSpeech {
    async fn stream_with_timestamps(
        &self,
        text: &str,
        voice_id: &str,
        _params: &VoiceParams,
    ) -> RelayResult<FragmentStream> {
        self.voices.lock().unwrap().push(voice_id.to_string());
        if self.fail {
            return Err(RelayError::Synthesis("quota exceeded".to_string()));
        }

        let engine = base64::engine::general_purpose::STANDARD;
        let split_at = text.len() / 2;
        let (head, tail) = text.split_at(split_at);
        let audio_split = self.audio.len() / 2;

        let fragments = vec![
            Ok(SynthesisFragment {
                audio_base64: Some(engine.encode(&self.audio[..audio_split])),
                alignment: Some(alignment_for(head, 0.0)),
            }),
            Ok(SynthesisFragment {
                audio_base64: Some(engine.encode(&self.audio[audio_split..])),
                alignment: Some(alignment_for(tail, head.chars().count() as f64 * 0.1)),
            }),
        ];

        Ok(stream::iter(fragments).boxed())
    }
}

//! Streaming decode of the `/generate` response body
//!
//! The body carries exactly one JSON document with no framing. Bytes are
//! accumulated and the whole buffer is re-parsed after every chunk; a parse
//! failure before the body ends only means "not complete yet". This relies on
//! the server never writing a second document into the same body.

use crate::audio::{AudioChunk, ChunkSink};
use crate::error::{RelayError, RelayResult};
use crate::protocol::{ReplyTimings, ResponseEnvelope};
use base64::Engine;
use futures::{Stream, StreamExt};
use tracing::{debug, info};

/// Read chunks until one complete envelope parses.
///
/// The decoded audio goes to `sink` and the text and word timings are
/// returned straight away; any chunks after the envelope are left unread.
pub async fn decode_envelope<S, B, E>(body: S, sink: &dyn ChunkSink) -> RelayResult<ReplyTimings>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<RelayError>,
{
    futures::pin_mut!(body);

    let mut buffer: Vec<u8> = Vec::new();
    let mut chunks = 0usize;
    let mut last_error = String::from("empty response body");

    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => return Err(e.into()),
        };
        let chunk = chunk.as_ref();
        if chunk.is_empty() {
            continue;
        }

        chunks += 1;
        buffer.extend_from_slice(chunk);

        match serde_json::from_slice::<ResponseEnvelope>(&buffer) {
            Ok(envelope) => {
                debug!(chunks, bytes = buffer.len(), "Envelope complete");
                return deliver(envelope, sink);
            }
            Err(e) => {
                last_error = e.to_string();
            }
        }
    }

    Err(RelayError::DecodeIncomplete {
        buffered: buffer.len(),
        reason: last_error,
    })
}

fn deliver(envelope: ResponseEnvelope, sink: &dyn ChunkSink) -> RelayResult<ReplyTimings> {
    envelope
        .timings
        .validate()
        .map_err(RelayError::MalformedEnvelope)?;

    let audio = base64::engine::general_purpose::STANDARD
        .decode(envelope.audio_base64.as_bytes())
        .map_err(|e| RelayError::MalformedEnvelope(format!("audio_base64: {}", e)))?;

    info!(
        "Received reply: {} words, {} audio bytes",
        envelope.timings.len(),
        audio.len()
    );

    if !audio.is_empty() {
        sink.enqueue(AudioChunk(audio));
    }

    Ok(ReplyTimings {
        text_response: envelope.text_response,
        timings: envelope.timings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::WordTimings;
    use futures::stream;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collector(Mutex<Vec<AudioChunk>>);

    impl ChunkSink for Collector {
        fn enqueue(&self, chunk: AudioChunk) {
            self.0.lock().unwrap().push(chunk);
        }
    }

    fn envelope_json() -> (Vec<u8>, Vec<u8>) {
        let audio: Vec<u8> = (0..=255u8).cycle().take(700).collect();
        let mut timings = WordTimings::default();
        timings.push("hi".into(), 0.0, 0.2);
        timings.push("you".into(), 0.3, 0.6);
        let envelope = ResponseEnvelope {
            text_response: "hi you".to_string(),
            audio_base64: base64::engine::general_purpose::STANDARD.encode(&audio),
            timings,
        };
        (serde_json::to_vec(&envelope).unwrap(), audio)
    }

    fn split(bytes: &[u8], points: &[usize]) -> Vec<Result<Vec<u8>, RelayError>> {
        let mut parts = Vec::new();
        let mut start = 0;
        for &p in points {
            parts.push(Ok(bytes[start..p].to_vec()));
            start = p;
        }
        parts.push(Ok(bytes[start..].to_vec()));
        parts
    }

    #[tokio::test]
    async fn decodes_regardless_of_split_points() {
        let (json, audio) = envelope_json();
        let n = json.len();

        let splits: Vec<Vec<usize>> = vec![
            vec![],
            vec![1],
            vec![n - 1],
            vec![n / 3, 2 * n / 3],
            (1..n).step_by(7).collect(),
            (1..n).collect(),
        ];

        for points in splits {
            let sink = Collector::default();
            let reply = decode_envelope(stream::iter(split(&json, &points)), &sink)
                .await
                .unwrap();

            assert_eq!(reply.text_response, "hi you");
            assert_eq!(reply.timings.words, vec!["hi", "you"]);
            assert_eq!(reply.timings.word_end_times_seconds, vec![0.2, 0.6]);

            let chunks = sink.0.into_inner().unwrap();
            assert_eq!(chunks.len(), 1, "exactly one envelope per request");
            assert_eq!(chunks[0].0, audio);
        }
    }

    #[tokio::test]
    async fn truncated_body_is_incomplete() {
        let (json, _) = envelope_json();
        let truncated = json[..json.len() - 5].to_vec();
        let sink = Collector::default();

        let result = decode_envelope(stream::iter(split(&truncated, &[10, 20])), &sink).await;

        match result {
            Err(RelayError::DecodeIncomplete { buffered, .. }) => {
                assert_eq!(buffered, truncated.len())
            }
            other => panic!("expected DecodeIncomplete, got {:?}", other),
        }
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_body_is_incomplete() {
        let sink = Collector::default();
        let body = stream::iter(Vec::<Result<Vec<u8>, RelayError>>::new());

        let result = decode_envelope(body, &sink).await;

        assert!(matches!(
            result,
            Err(RelayError::DecodeIncomplete { buffered: 0, .. })
        ));
    }

    #[tokio::test]
    async fn stops_reading_after_envelope() {
        let (json, _) = envelope_json();
        let mut parts = split(&json, &[json.len() / 2]);
        parts.push(Err(RelayError::Output("must not be read".to_string())));
        let sink = Collector::default();

        let reply = decode_envelope(stream::iter(parts), &sink).await.unwrap();

        assert_eq!(reply.text_response, "hi you");
    }

    #[tokio::test]
    async fn ragged_timings_are_malformed() {
        let json = serde_json::json!({
            "text_response": "hi",
            "audio_base64": "",
            "words": ["hi"],
            "word_start_times_seconds": [0.0, 1.0],
            "word_end_times_seconds": [0.5]
        })
        .to_string();
        let sink = Collector::default();

        let result =
            decode_envelope(stream::iter(vec![Ok::<_, RelayError>(json.into_bytes())]), &sink).await;

        assert!(matches!(result, Err(RelayError::MalformedEnvelope(_))));
    }
}

//! Serialized playback of encoded audio chunks
//!
//! One producer (the response decoder) enqueues chunks; one consumer task
//! decodes and plays them, one at a time, in arrival order. The consumer
//! waits on "item available" and "stop requested" together, so an idle loop
//! notices a stop without polling.

use super::decode::decode_chunk;
use super::output::AudioOutput;
use crate::error::{RelayError, RelayResult};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, Mutex as AsyncMutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// One transport-level unit of encoded audio
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk(pub Vec<u8>);

impl AudioChunk {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for AudioChunk {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Anything that accepts decoded-from-the-wire audio for playback
pub trait ChunkSink: Send + Sync {
    fn enqueue(&self, chunk: AudioChunk);
}

#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Channel count of the output device; mono chunks are upmixed to it
    pub output_channels: u16,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self { output_channels: 2 }
    }
}

/// Outcome of one consumer run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackReport {
    pub chunks_played: usize,
}

/// FIFO shared between the producer and the consumer task
#[derive(Default)]
struct AudioQueue {
    items: Mutex<VecDeque<AudioChunk>>,
    closed: AtomicBool,
    /// Set by a stop; chunks pushed until the next start are dropped.
    /// Only read or written while `items` is locked.
    discarding: AtomicBool,
    notify: Notify,
}

impl AudioQueue {
    /// Returns false if the chunk was dropped because playback was stopped
    fn push(&self, chunk: AudioChunk) -> bool {
        {
            let mut items = self.lock();
            if self.discarding.load(Ordering::SeqCst) {
                return false;
            }
            items.push_back(chunk);
        }
        self.notify.notify_one();
        true
    }

    /// Next chunk, or `None` once the queue is closed and empty
    async fn pop(&self) -> Option<AudioChunk> {
        loop {
            let notified = self.notify.notified();
            let next = self.lock().pop_front();
            if let Some(chunk) = next {
                return Some(chunk);
            }
            if self.closed.load(Ordering::SeqCst) {
                return None;
            }
            notified.await;
        }
    }

    /// Drop everything queued and refuse new chunks until `reopen`
    fn discard(&self) -> usize {
        let mut items = self.lock();
        self.discarding.store(true, Ordering::SeqCst);
        let dropped = items.len();
        items.clear();
        dropped
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    fn reopen(&self) {
        let _items = self.lock();
        self.discarding.store(false, Ordering::SeqCst);
        self.closed.store(false, Ordering::SeqCst);
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<AudioChunk>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Queue plus a dedicated consumer task that plays chunks back to back
pub struct PlaybackScheduler {
    config: PlaybackConfig,
    output: Arc<dyn AudioOutput>,
    queue: Arc<AudioQueue>,
    running: watch::Sender<bool>,
    consumer: AsyncMutex<Option<JoinHandle<RelayResult<PlaybackReport>>>>,
}

impl PlaybackScheduler {
    pub fn new(output: Arc<dyn AudioOutput>, config: PlaybackConfig) -> Self {
        let (running, _) = watch::channel(false);

        info!(
            "Playback scheduler using {} output ({} channels)",
            output.name(),
            config.output_channels
        );

        Self {
            config,
            output,
            queue: Arc::new(AudioQueue::default()),
            running,
            consumer: AsyncMutex::new(None),
        }
    }

    /// Mark playback as running and launch the consumer if it is not already up
    pub async fn start(&self) {
        let mut consumer = self.consumer.lock().await;

        self.queue.reopen();
        self.running.send_replace(true);

        if let Some(handle) = consumer.as_ref() {
            if !handle.is_finished() {
                debug!("Playback consumer already running");
                return;
            }
            // A finished consumer that was never joined; its result is superseded
            if let Some(stale) = consumer.take() {
                if let Ok(Err(e)) = stale.await {
                    warn!("Discarding result of previous playback run: {}", e);
                }
            }
        }

        let task = tokio::spawn(run_consumer(
            Arc::clone(&self.queue),
            Arc::clone(&self.output),
            self.config.output_channels,
            self.running.subscribe(),
        ));
        *consumer = Some(task);

        info!("Playback consumer started");
    }

    /// Stop right away: halt the device and discard whatever is still queued
    ///
    /// Chunks enqueued after this and before the next `start` are dropped too.
    /// Returns the number of discarded chunks.
    pub fn stop(&self) -> usize {
        self.running.send_replace(false);
        self.output.stop();
        let dropped = self.queue.discard();

        info!("Playback stopped ({} queued chunks discarded)", dropped);
        dropped
    }

    /// No more chunks for this exchange; the consumer exits once the queue drains
    pub fn finish(&self) {
        self.queue.close();
    }

    /// Wait for the consumer task to exit
    ///
    /// Returns an empty report if no consumer was started.
    pub async fn join(&self) -> RelayResult<PlaybackReport> {
        let handle = self.consumer.lock().await.take();

        match handle {
            Some(handle) => handle
                .await
                .map_err(|e| RelayError::PlaybackTask(e.to_string()))?,
            None => Ok(PlaybackReport::default()),
        }
    }

    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }

    /// Number of chunks waiting to be played
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl ChunkSink for PlaybackScheduler {
    fn enqueue(&self, chunk: AudioChunk) {
        let len = chunk.len();
        if self.queue.push(chunk) {
            debug!("Queued audio chunk ({} bytes)", len);
        } else {
            debug!("Playback stopped, dropped audio chunk ({} bytes)", len);
        }
    }
}

async fn run_consumer(
    queue: Arc<AudioQueue>,
    output: Arc<dyn AudioOutput>,
    output_channels: u16,
    mut running: watch::Receiver<bool>,
) -> RelayResult<PlaybackReport> {
    let mut report = PlaybackReport::default();

    loop {
        let chunk = tokio::select! {
            biased;
            _ = running.wait_for(|running| !*running) => break,
            next = queue.pop() => match next {
                Some(chunk) => chunk,
                None => break,
            },
        };

        let device = Arc::clone(&output);
        let played = tokio::task::spawn_blocking(move || -> RelayResult<()> {
            let pcm = decode_chunk(&chunk.0)?.upmix(output_channels);
            device.play(&pcm)?;
            device.wait();
            Ok(())
        })
        .await
        .map_err(|e| RelayError::PlaybackTask(e.to_string()))?;

        if let Err(e) = played {
            error!("Error playing audio chunk: {}", e);
            return Err(e);
        }

        report.chunks_played += 1;
    }

    info!("Playback consumer exited ({} chunks played)", report.chunks_played);
    Ok(report)
}

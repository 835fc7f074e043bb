//! Gapless playback scheduling for inbound voice audio.
//!
//! Chunks arrive over the network in playback order but with jittery
//! timing. The scheduler assigns each chunk a start time of
//! `max(end of previous chunk, playback clock)`: back-to-back chunks play
//! gaplessly, late arrivals start immediately without overlapping what is
//! already queued. An interruption (barge-in) cancels everything scheduled
//! and resets the clock so new audio starts at once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

/// Handle to one scheduled chunk.
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    token: CancellationToken,
    end: Duration,
}

impl PlaybackHandle {
    /// Create a handle ending at `end` on the scheduler clock.
    pub fn new(token: CancellationToken, end: Duration) -> Self {
        Self { token, end }
    }

    /// Cancel the chunk: if it has not started it must never play, and if
    /// it is playing it must stop.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the chunk was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Scheduled end time on the scheduler clock.
    pub fn end(&self) -> Duration {
        self.end
    }
}

/// Sink that actually renders audio (speaker device, or a recorder in
/// tests).
pub trait PlaybackSink: Send + Sync {
    /// Schedule `samples` to start at `start` on the caller's clock.
    ///
    /// The returned handle's token must be honored: once cancelled, no
    /// further audio from this chunk may be rendered.
    fn play_at(&self, samples: Vec<f32>, sample_rate: u32, start: Duration) -> PlaybackHandle;
}

/// Orders inbound chunks on a single playback clock.
pub struct PlaybackScheduler {
    sink: Arc<dyn PlaybackSink>,
    sample_rate: u32,
    epoch: Instant,
    next_start: Duration,
    scheduled: Vec<PlaybackHandle>,
}

impl PlaybackScheduler {
    /// Create a scheduler; the playback clock starts now.
    pub fn new(sink: Arc<dyn PlaybackSink>, sample_rate: u32) -> Self {
        Self {
            sink,
            sample_rate,
            epoch: Instant::now(),
            next_start: Duration::ZERO,
            scheduled: Vec::new(),
        }
    }

    #[cfg(test)]
    fn with_epoch(sink: Arc<dyn PlaybackSink>, sample_rate: u32, epoch: Instant) -> Self {
        Self {
            sink,
            sample_rate,
            epoch,
            next_start: Duration::ZERO,
            scheduled: Vec::new(),
        }
    }

    /// Current playback clock.
    pub fn clock(&self) -> Duration {
        self.epoch.elapsed()
    }

    /// Schedule one decoded chunk; returns its start time on the clock.
    pub fn schedule(&mut self, samples: Vec<f32>) -> Duration {
        let duration = Duration::from_secs_f64(samples.len() as f64 / self.sample_rate as f64);
        let start = self.next_start.max(self.clock());
        let handle = self.sink.play_at(samples, self.sample_rate, start);
        self.next_start = start + duration;
        self.prune();
        self.scheduled.push(handle);
        start
    }

    /// Barge-in: cancel every scheduled chunk and reset the clock so the
    /// next chunk starts immediately.
    pub fn interrupt(&mut self) {
        for handle in self.scheduled.drain(..) {
            handle.cancel();
        }
        self.next_start = Duration::ZERO;
    }

    /// Stop playback entirely (session close). Nothing may sound after
    /// this returns.
    pub fn stop(&mut self) {
        for handle in self.scheduled.drain(..) {
            handle.cancel();
        }
    }

    /// Number of chunks currently tracked (not yet finished or cancelled).
    pub fn pending(&self) -> usize {
        self.scheduled.len()
    }

    fn prune(&mut self) {
        let now = self.clock();
        self.scheduled
            .retain(|h| !h.is_cancelled() && h.end() > now);
    }
}

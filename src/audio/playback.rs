//! Scheduled audio playback to system speakers via cpal.
//!
//! The voice session's scheduler assigns each chunk a start time on its
//! playback clock; this sink renders those chunks from a timeline mixer
//! driven by the output stream's sample counter. Cancelled chunks are
//! dropped before their samples reach the device.

use cpal::StreamConfig;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::AudioConfig;
use crate::error::{AssistantError, Result};
use crate::voice::{PlaybackHandle, PlaybackSink};

/// One chunk placed on the output timeline.
struct TimelineChunk {
    samples: Vec<f32>,
    start_sample: u64,
    token: CancellationToken,
}

/// Mixer state shared with the output stream callback.
struct Mixer {
    chunks: Vec<TimelineChunk>,
    /// Samples rendered since the stream started.
    clock_samples: u64,
    /// Alignment between the caller's clock and the stream clock,
    /// established at the first scheduled chunk.
    base: Option<(Duration, u64)>,
}

/// Speaker playback sink backed by cpal.
pub struct CpalPlaybackSink {
    mixer: Arc<Mutex<Mixer>>,
    sample_rate: u32,
    stopped: Arc<AtomicBool>,
}

impl CpalPlaybackSink {
    /// Create the sink and start the output stream.
    ///
    /// # Errors
    ///
    /// Returns an error if no output device is available.
    pub fn new(config: &AudioConfig) -> Result<Self> {
        let host = cpal::default_host();
        let device = if let Some(ref name) = config.output_device {
            host.output_devices()
                .map_err(|e| AssistantError::Audio(format!("cannot enumerate devices: {e}")))?
                .find(|d| {
                    d.description()
                        .ok()
                        .map(|desc| desc.name() == name)
                        .unwrap_or(false)
                })
                .ok_or_else(|| AssistantError::Audio(format!("output device '{name}' not found")))?
        } else {
            host.default_output_device()
                .ok_or_else(|| AssistantError::Audio("no default output device".into()))?
        };

        let device_name = device
            .description()
            .map(|d| d.name().to_owned())
            .unwrap_or_else(|_| "<unknown>".into());
        info!("using output device: {device_name}");

        let stream_config = StreamConfig {
            channels: 1,
            sample_rate: config.playback_sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        let mixer = Arc::new(Mutex::new(Mixer {
            chunks: Vec::new(),
            clock_samples: 0,
            base: None,
        }));
        let mixer_cb = Arc::clone(&mixer);
        let stopped = Arc::new(AtomicBool::new(false));
        let stopped_thread = Arc::clone(&stopped);

        std::thread::spawn(move || {
            let stream = device.build_output_stream(
                &stream_config,
                move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                    render(&mixer_cb, data);
                },
                move |err| {
                    error!("audio output stream error: {err}");
                },
                None,
            );
            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    error!("failed to build output stream: {e}");
                    return;
                }
            };
            if let Err(e) = stream.play() {
                error!("failed to start output stream: {e}");
                return;
            }
            while !stopped_thread.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(100));
            }
            drop(stream);
            debug!("audio playback stream stopped");
        });

        Ok(Self {
            mixer,
            sample_rate: config.playback_sample_rate,
            stopped,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Mixer> {
        match self.mixer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for CpalPlaybackSink {
    fn drop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

impl PlaybackSink for CpalPlaybackSink {
    fn play_at(&self, samples: Vec<f32>, sample_rate: u32, start: Duration) -> PlaybackHandle {
        if sample_rate != self.sample_rate {
            warn!(
                "chunk sample rate {sample_rate}Hz differs from stream rate {}Hz",
                self.sample_rate
            );
        }
        let duration = Duration::from_secs_f64(samples.len() as f64 / self.sample_rate as f64);
        let token = CancellationToken::new();

        let mut mixer = self.lock();
        let clock_now = mixer.clock_samples;
        let (base_start, base_clock) = *mixer.base.get_or_insert((start, clock_now));
        let offset = start.saturating_sub(base_start);
        let start_sample =
            base_clock + (offset.as_secs_f64() * self.sample_rate as f64).round() as u64;
        mixer.chunks.push(TimelineChunk {
            samples,
            start_sample,
            token: token.clone(),
        });

        PlaybackHandle::new(token, start + duration)
    }
}

/// Fill one output buffer from the timeline.
fn render(mixer: &Arc<Mutex<Mixer>>, data: &mut [f32]) {
    let mut mixer = match mixer.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    let clock = mixer.clock_samples;
    let frame_len = data.len() as u64;

    mixer.chunks.retain(|chunk| {
        !chunk.token.is_cancelled() && chunk.start_sample + chunk.samples.len() as u64 > clock
    });

    for (i, out) in data.iter_mut().enumerate() {
        let t = clock + i as u64;
        let mut acc = 0.0f32;
        for chunk in &mixer.chunks {
            if t >= chunk.start_sample {
                if let Some(sample) = chunk.samples.get((t - chunk.start_sample) as usize) {
                    acc += sample;
                }
            }
        }
        *out = acc.clamp(-1.0, 1.0);
    }

    mixer.clock_samples = clock + frame_len;
}

//! Microphone capture using cpal.
//!
//! Captures at the device's native sample rate and downsamples to 16kHz
//! mono for the voice session's encode path.

use cpal::StreamConfig;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::{downsample, to_mono};
use crate::config::AudioConfig;
use crate::error::{AssistantError, Result};
use crate::voice::CaptureSource;

/// Frame channel depth; frames are dropped rather than blocking the audio
/// thread when the consumer falls behind.
const FRAME_CHANNEL_SIZE: usize = 64;

/// Microphone capture source backed by cpal.
pub struct CpalCapture {
    device_name: Option<String>,
    target_sample_rate: u32,
    frame_size: usize,
}

impl CpalCapture {
    /// Create a capture source for the configured input device.
    pub fn new(config: &AudioConfig, frame_size: usize) -> Self {
        Self {
            device_name: config.input_device.clone(),
            target_sample_rate: config.capture_sample_rate,
            frame_size,
        }
    }

    fn find_device(&self) -> Result<cpal::Device> {
        let host = cpal::default_host();
        if let Some(ref name) = self.device_name {
            host.input_devices()
                .map_err(|e| AssistantError::Audio(format!("cannot enumerate devices: {e}")))?
                .find(|d| {
                    d.description()
                        .ok()
                        .map(|desc| desc.name() == name)
                        .unwrap_or(false)
                })
                .ok_or_else(|| AssistantError::Audio(format!("input device '{name}' not found")))
        } else {
            host.default_input_device()
                .ok_or_else(|| AssistantError::Audio("no default input device".into()))
        }
    }
}

impl CaptureSource for CpalCapture {
    /// Start capturing. The stream lives on a dedicated thread (cpal
    /// streams are not `Send` everywhere) and stops when the returned
    /// receiver is dropped.
    fn open(&self) -> Result<mpsc::Receiver<Vec<f32>>> {
        let device = self.find_device()?;
        let device_name = device
            .description()
            .map(|d| d.name().to_owned())
            .unwrap_or_else(|_| "<unknown>".into());
        info!("using input device: {device_name}");

        let default_config = device
            .default_input_config()
            .map_err(|e| AssistantError::Audio(format!("no default input config: {e}")))?;
        let native_rate = default_config.sample_rate();
        let native_channels = default_config.channels();
        let stream_config = StreamConfig {
            channels: native_channels,
            sample_rate: native_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        let (tx, rx) = mpsc::channel(FRAME_CHANNEL_SIZE);
        let target_rate = self.target_sample_rate;
        let frame_size = self.frame_size;
        let stopped = Arc::new(AtomicBool::new(false));
        let stopped_cb = Arc::clone(&stopped);

        std::thread::spawn(move || {
            let mut pending: Vec<f32> = Vec::with_capacity(frame_size * 2);
            let stream = device.build_input_stream(
                &stream_config,
                move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                    let mono = if native_channels > 1 {
                        to_mono(data, native_channels)
                    } else {
                        data.to_vec()
                    };
                    let samples = if native_rate != target_rate {
                        downsample(&mono, native_rate, target_rate)
                    } else {
                        mono
                    };
                    pending.extend_from_slice(&samples);
                    while pending.len() >= frame_size {
                        let frame: Vec<f32> = pending.drain(..frame_size).collect();
                        // try_send keeps the audio thread non-blocking
                        match tx.try_send(frame) {
                            Ok(()) => {}
                            Err(mpsc::error::TrySendError::Full(_)) => {
                                debug!("capture channel full, dropping frame");
                            }
                            Err(mpsc::error::TrySendError::Closed(_)) => {
                                stopped_cb.store(true, Ordering::SeqCst);
                                return;
                            }
                        }
                    }
                },
                move |err| {
                    error!("audio input stream error: {err}");
                },
                None,
            );

            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    error!("failed to build input stream: {e}");
                    return;
                }
            };
            if let Err(e) = stream.play() {
                error!("failed to start input stream: {e}");
                return;
            }
            info!("audio capture started: native {native_rate}Hz -> target {target_rate}Hz");

            // Hold the stream alive until the consumer goes away.
            while !stopped.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(100));
            }
            drop(stream);
            info!("audio capture stopped");
        });

        Ok(rx)
    }
}

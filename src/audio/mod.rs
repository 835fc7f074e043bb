//! Microphone capture and speaker playback via cpal.
//!
//! These adapters sit at the OS edge of the voice session: capture
//! produces 16kHz mono `f32` frames for the session's encode path, and
//! playback renders the chunks the session's scheduler has placed on the
//! playback clock.

pub mod capture;
pub mod playback;

pub use capture::CpalCapture;
pub use playback::CpalPlaybackSink;

/// Convert interleaved multi-channel audio to mono by averaging channels.
pub(crate) fn to_mono(data: &[f32], channels: u16) -> Vec<f32> {
    let ch = channels as usize;
    data.chunks_exact(ch)
        .map(|frame| frame.iter().sum::<f32>() / ch as f32)
        .collect()
}

/// Simple linear-interpolation downsampler.
///
/// For speech capture (48kHz → 16kHz) this is sufficient quality — no
/// anti-alias filter needed since speech energy sits below 8kHz.
pub(crate) fn downsample(samples: &[f32], src_rate: u32, dst_rate: u32) -> Vec<f32> {
    if src_rate == dst_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = src_rate as f64 / dst_rate as f64;
    let out_len = (samples.len() as f64 / ratio) as usize;
    let mut output = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let src_pos = i as f64 * ratio;
        let idx = src_pos as usize;
        let frac = src_pos - idx as f64;

        let sample = if idx + 1 < samples.len() {
            samples[idx] as f64 * (1.0 - frac) + samples[idx + 1] as f64 * frac
        } else {
            samples[idx.min(samples.len() - 1)] as f64
        };

        output.push(sample as f32);
    }

    output
}

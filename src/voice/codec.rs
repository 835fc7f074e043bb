//! Audio frame transport codec.
//!
//! Voice frames cross the wire as base64-encoded little-endian 16-bit PCM:
//! 16kHz mono outbound (microphone), 24kHz mono inbound (playback).
//! In-process audio is `f32` in \[-1, 1\]; conversion clamps rather than
//! wraps on overdriven samples.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{AssistantError, Result};

/// Encode a capture frame as base64 PCM16-LE.
pub fn encode_frame(samples: &[f32]) -> String {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        let clamped = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
        bytes.extend_from_slice(&clamped.to_le_bytes());
    }
    STANDARD.encode(bytes)
}

/// Decode a base64 PCM16-LE payload into `f32` samples.
///
/// # Errors
///
/// Returns an error when the payload is not valid base64 or has an odd
/// byte count.
pub fn decode_chunk(data: &str) -> Result<Vec<f32>> {
    let bytes = STANDARD
        .decode(data)
        .map_err(|e| AssistantError::AudioCodec(format!("invalid base64 audio: {e}")))?;
    if bytes.len() % 2 != 0 {
        return Err(AssistantError::AudioCodec(format!(
            "odd PCM16 byte count: {}",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect())
}

//! Configuration types for the map assistant.

use crate::error::{AssistantError, Result};
use crate::state::LatLng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for the assistant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Audio capture/playback settings.
    pub audio: AudioConfig,
    /// Model provider settings.
    pub model: ModelConfig,
    /// Map view defaults.
    pub map: MapConfig,
    /// Marker synthesis settings.
    pub markers: MarkerConfig,
    /// Streaming voice session settings.
    pub voice: VoiceConfig,
}

/// Audio I/O configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Capture (microphone) sample rate in Hz.
    pub capture_sample_rate: u32,
    /// Playback sample rate in Hz.
    pub playback_sample_rate: u32,
    /// Input device name (None = system default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_device: Option<String>,
    /// Output device name (None = system default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            capture_sample_rate: 16_000,
            playback_sample_rate: 24_000,
            input_device: None,
            output_device: None,
        }
    }
}

/// Model provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Provider endpoint URL for chat turns.
    pub endpoint: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/v1/generate".to_owned(),
            model: "maps-assistant-1".to_owned(),
            api_key_env: "WAYPOINT_API_KEY".to_owned(),
        }
    }
}

impl ModelConfig {
    /// Resolve the API key from the configured environment variable.
    ///
    /// Returns `None` when the variable is unset or empty — the provider
    /// may be a local endpoint with no auth.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|v| !v.trim().is_empty())
    }
}

/// Map view defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Center used before any viewport update arrives.
    pub default_center: LatLng,
    /// Zoom level used before any viewport update arrives.
    pub default_zoom: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            // Trafalgar Square — an arbitrary city-scale starting view.
            default_center: LatLng {
                lat: 51.508,
                lng: -0.128,
            },
            default_zoom: 12.0,
        }
    }
}

/// Marker synthesis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Maximum jitter radius around the viewport center, in km.
    ///
    /// Synthesized markers are placed uniformly within this radius since
    /// no real geocoding is performed.
    pub jitter_km: f64,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self { jitter_km: 3.0 }
    }
}

/// Streaming voice session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// WebSocket endpoint for the bidirectional voice stream.
    pub endpoint: String,
    /// Capture frame size in samples (at the capture rate).
    pub frame_size: usize,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://localhost:8080/v1/voice".to_owned(),
            frame_size: 2_048, // 128ms at 16kHz
        }
    }
}

impl AssistantConfig {
    /// Default config file path under the platform config directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("waypoint")
            .join("config.toml")
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| AssistantError::Config(format!("cannot parse {}: {e}", path.display())))
    }

    /// Load configuration from a file, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error only when the file exists but cannot be parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

//! Error types for the map assistant.

/// Top-level error type for the assistant.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// Model provider request error (network, API).
    #[error("model error: {0}")]
    Model(String),

    /// Voice session transport error.
    #[error("voice transport error: {0}")]
    VoiceTransport(String),

    /// Audio encode/decode error.
    #[error("audio codec error: {0}")]
    AudioCodec(String),

    /// Audio device or stream error.
    #[error("audio error: {0}")]
    Audio(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AssistantError>;

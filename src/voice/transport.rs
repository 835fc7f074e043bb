//! Voice session transport.
//!
//! The voice backend is a bidirectional message stream. Outbound messages
//! carry encoded microphone frames and correlated tool results; inbound
//! messages carry playback audio, tool-call envelopes, interruption
//! signals and errors. The transport is abstracted behind connector/sender/
//! receiver traits so the session controller can be driven by a scripted
//! transport in tests; the production implementation speaks JSON over
//! WebSocket.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, warn};

use crate::error::{AssistantError, Result};

/// Messages sent to the voice backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// One encoded microphone frame (base64 PCM16-LE, 16kHz mono).
    Audio {
        /// Base64 payload.
        data: String,
    },
    /// Correlated response to a tool-call envelope.
    ToolResult {
        /// The originating call's id.
        id: String,
        /// The tool name, echoed back.
        name: String,
        /// The tool's acknowledgement payload.
        result: String,
    },
}

/// Messages received from the voice backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// One playback chunk (base64 PCM16-LE, 24kHz mono).
    Audio {
        /// Base64 payload.
        data: String,
    },
    /// A tool call to execute, expecting a correlated [`ClientMessage::ToolResult`].
    ToolCall {
        /// Correlation id.
        id: String,
        /// Declared tool name.
        name: String,
        /// Arguments object.
        #[serde(default)]
        args: serde_json::Value,
    },
    /// The remote side started a new utterance: cancel scheduled playback.
    Interrupted,
    /// Fatal session error reported by the backend.
    Error {
        /// Backend-provided detail (log-only).
        message: String,
    },
}

/// Sending half of a voice transport.
#[async_trait]
pub trait VoiceSender: Send {
    /// Send one message.
    ///
    /// # Errors
    ///
    /// Returns an error when the transport is no longer writable; the
    /// session treats that as fatal.
    async fn send(&mut self, message: ClientMessage) -> Result<()>;
}

/// Receiving half of a voice transport.
#[async_trait]
pub trait VoiceReceiver: Send {
    /// Receive the next message; `None` means the remote side closed.
    async fn recv(&mut self) -> Option<ServerMessage>;
}

/// Opens voice transport connections.
#[async_trait]
pub trait VoiceConnector: Send + Sync {
    /// Open a fresh bidirectional connection.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection cannot be established.
    async fn connect(&self) -> Result<(Box<dyn VoiceSender>, Box<dyn VoiceReceiver>)>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket connector for the production voice backend.
pub struct WsVoiceConnector {
    endpoint: String,
}

impl WsVoiceConnector {
    /// Create a connector for the given `ws://` / `wss://` endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl VoiceConnector for WsVoiceConnector {
    async fn connect(&self) -> Result<(Box<dyn VoiceSender>, Box<dyn VoiceReceiver>)> {
        let url = url::Url::parse(&self.endpoint).map_err(|e| {
            AssistantError::VoiceTransport(format!(
                "invalid voice endpoint '{}': {e}",
                self.endpoint
            ))
        })?;
        let (stream, _response) = connect_async(url.as_str()).await.map_err(|e| {
            AssistantError::VoiceTransport(format!("cannot connect to {}: {e}", self.endpoint))
        })?;
        debug!(endpoint = %self.endpoint, "voice transport connected");
        let (sink, stream) = stream.split();
        Ok((
            Box::new(WsSender { sink }),
            Box::new(WsReceiver { stream }),
        ))
    }
}

struct WsSender {
    sink: SplitSink<WsStream, Message>,
}

#[async_trait]
impl VoiceSender for WsSender {
    async fn send(&mut self, message: ClientMessage) -> Result<()> {
        let json = serde_json::to_string(&message)
            .map_err(|e| AssistantError::VoiceTransport(format!("cannot encode message: {e}")))?;
        self.sink
            .send(Message::Text(json))
            .await
            .map_err(|e| AssistantError::VoiceTransport(format!("send failed: {e}")))
    }
}

struct WsReceiver {
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl VoiceReceiver for WsReceiver {
    async fn recv(&mut self) -> Option<ServerMessage> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(raw)) => match serde_json::from_str(&raw) {
                    Ok(message) => return Some(message),
                    Err(e) => {
                        warn!(error = %e, "skipping unparseable voice message");
                    }
                },
                Ok(Message::Close(_)) => return None,
                Ok(_) => {
                    // Binary/ping/pong frames are not part of the protocol.
                }
                Err(e) => {
                    error!(error = %e, "voice transport read failed");
                    return None;
                }
            }
        }
    }
}

//! Shared scripted collaborators for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use waypoint::error::{AssistantError, Result};
use waypoint::model::{ModelClient, ModelRequest, ModelResponse};
use waypoint::voice::{
    CaptureSource, ClientMessage, PlaybackHandle, PlaybackSink, ServerMessage, VoiceConnector,
    VoiceReceiver, VoiceSender,
};

// ── model client ──────────────────────────────────────────────

/// Replays scripted responses, recording every request.
pub struct ScriptedModelClient {
    responses: Mutex<VecDeque<Result<ModelResponse>>>,
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModelClient {
    pub fn new(responses: Vec<Result<ModelResponse>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelClient for ScriptedModelClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
        let next = self
            .responses
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front());
        next.unwrap_or_else(|| Ok(ModelResponse::default()))
    }
}

// ── voice transport ───────────────────────────────────────────

pub struct ChannelSender {
    tx: mpsc::UnboundedSender<ClientMessage>,
}

#[async_trait]
impl VoiceSender for ChannelSender {
    async fn send(&mut self, message: ClientMessage) -> Result<()> {
        self.tx
            .send(message)
            .map_err(|_| AssistantError::VoiceTransport("closed".to_owned()))
    }
}

pub struct ChannelReceiver {
    rx: mpsc::UnboundedReceiver<ServerMessage>,
}

#[async_trait]
impl VoiceReceiver for ChannelReceiver {
    async fn recv(&mut self) -> Option<ServerMessage> {
        self.rx.recv().await
    }
}

/// Channel-backed connector; the test keeps the far ends for scripting.
pub struct ScriptedConnector {
    halves: Mutex<Option<(ChannelSender, ChannelReceiver)>>,
}

impl ScriptedConnector {
    pub fn new() -> (
        Arc<Self>,
        mpsc::UnboundedReceiver<ClientMessage>,
        mpsc::UnboundedSender<ServerMessage>,
    ) {
        let (client_tx, client_rx) = mpsc::unbounded_channel();
        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            halves: Mutex::new(Some((
                ChannelSender { tx: client_tx },
                ChannelReceiver { rx: server_rx },
            ))),
        });
        (connector, client_rx, server_tx)
    }
}

#[async_trait]
impl VoiceConnector for ScriptedConnector {
    async fn connect(&self) -> Result<(Box<dyn VoiceSender>, Box<dyn VoiceReceiver>)> {
        let halves = self.halves.lock().ok().and_then(|mut slot| slot.take());
        match halves {
            Some((sender, receiver)) => Ok((Box::new(sender), Box::new(receiver))),
            None => Err(AssistantError::VoiceTransport(
                "already connected".to_owned(),
            )),
        }
    }
}

/// Connector that always fails — for chat-only tests.
pub struct UnavailableConnector;

#[async_trait]
impl VoiceConnector for UnavailableConnector {
    async fn connect(&self) -> Result<(Box<dyn VoiceSender>, Box<dyn VoiceReceiver>)> {
        Err(AssistantError::VoiceTransport("unavailable".to_owned()))
    }
}

// ── capture ───────────────────────────────────────────────────

/// Capture source fed from a test-held channel.
pub struct ChannelCapture {
    rx: Mutex<Option<mpsc::Receiver<Vec<f32>>>>,
}

impl ChannelCapture {
    pub fn new() -> (Arc<Self>, mpsc::Sender<Vec<f32>>) {
        let (tx, rx) = mpsc::channel(16);
        (
            Arc::new(Self {
                rx: Mutex::new(Some(rx)),
            }),
            tx,
        )
    }
}

impl CaptureSource for ChannelCapture {
    fn open(&self) -> Result<mpsc::Receiver<Vec<f32>>> {
        self.rx
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
            .ok_or_else(|| AssistantError::Audio("no microphone".to_owned()))
    }
}

/// Capture source with no device — for chat-only tests.
pub struct UnavailableCapture;

impl CaptureSource for UnavailableCapture {
    fn open(&self) -> Result<mpsc::Receiver<Vec<f32>>> {
        Err(AssistantError::Audio("no microphone".to_owned()))
    }
}

// ── playback sink ─────────────────────────────────────────────

/// Records scheduled chunks and their cancellation tokens.
#[derive(Default)]
pub struct RecordingSink {
    tokens: Mutex<Vec<CancellationToken>>,
}

impl RecordingSink {
    pub fn tokens(&self) -> Vec<CancellationToken> {
        self.tokens
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl PlaybackSink for RecordingSink {
    fn play_at(&self, samples: Vec<f32>, sample_rate: u32, start: Duration) -> PlaybackHandle {
        let token = CancellationToken::new();
        let duration = Duration::from_secs_f64(samples.len() as f64 / sample_rate as f64);
        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.push(token.clone());
        }
        PlaybackHandle::new(token, start + duration)
    }
}

// ── helpers ───────────────────────────────────────────────────

/// Poll `check` until it holds or ~400ms elapse.
pub async fn wait_until(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    false
}

//! Streaming voice session.
//!
//! A long-lived bidirectional audio session, independent of the chat turn
//! pipeline but sharing its tool executor. The session runs three tasks:
//! a capture loop encoding microphone frames onto the wire as they become
//! available, a writer owning the transport's sending half, and a receive
//! loop decoding playback audio, answering tool calls, and honoring
//! interruption (barge-in) signals. Closing the session — user stop,
//! remote close, or a fatal error — deterministically stops capture and
//! cancels all scheduled playback.

pub mod codec;
pub mod playback;
pub mod transport;

pub use playback::{PlaybackHandle, PlaybackScheduler, PlaybackSink};
pub use transport::{ClientMessage, ServerMessage, VoiceConnector, VoiceReceiver, VoiceSender, WsVoiceConnector};

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio_stream::{StreamExt, wrappers::ReceiverStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::model::FunctionCall;
use crate::tools::ToolExecutor;

/// Voice session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No session. Opening again requires a fresh [`VoiceSessionController::open`].
    Closed,
    /// Acquiring the microphone and connecting the transport.
    Opening,
    /// Capture and playback are live.
    Open,
}

/// Source of microphone frames (an OS-provided stream).
///
/// Frames are `f32` mono samples at the capture rate. Dropping the
/// returned receiver must stop the underlying capture.
pub trait CaptureSource: Send + Sync {
    /// Start capturing and return the frame stream.
    ///
    /// # Errors
    ///
    /// Returns an error when no capture device is available.
    fn open(&self) -> Result<mpsc::Receiver<Vec<f32>>>;
}

struct Shared {
    status: SessionStatus,
    cancel: Option<CancellationToken>,
}

/// Controls one voice session at a time.
pub struct VoiceSessionController {
    connector: Arc<dyn VoiceConnector>,
    capture: Arc<dyn CaptureSource>,
    sink: Arc<dyn PlaybackSink>,
    executor: Arc<ToolExecutor>,
    playback_sample_rate: u32,
    shared: Arc<Mutex<Shared>>,
}

impl VoiceSessionController {
    /// Create a controller. No session is opened yet.
    pub fn new(
        connector: Arc<dyn VoiceConnector>,
        capture: Arc<dyn CaptureSource>,
        sink: Arc<dyn PlaybackSink>,
        executor: Arc<ToolExecutor>,
        playback_sample_rate: u32,
    ) -> Self {
        Self {
            connector,
            capture,
            sink,
            executor,
            playback_sample_rate,
            shared: Arc::new(Mutex::new(Shared {
                status: SessionStatus::Closed,
                cancel: None,
            })),
        }
    }

    /// Current session status.
    pub fn status(&self) -> SessionStatus {
        lock(&self.shared).status
    }

    /// Open a session: acquire the microphone, connect the transport, and
    /// start the capture/receive loops. A no-op when a session is already
    /// opening or open.
    ///
    /// # Errors
    ///
    /// Returns an error when the microphone or the transport cannot be
    /// acquired; the controller returns to `Closed`.
    pub async fn open(&self) -> Result<()> {
        {
            let mut shared = lock(&self.shared);
            if shared.status != SessionStatus::Closed {
                debug!("voice session already active, ignoring open");
                return Ok(());
            }
            shared.status = SessionStatus::Opening;
        }

        let frames = match self.capture.open() {
            Ok(frames) => frames,
            Err(e) => {
                error!(error = %e, "cannot acquire microphone");
                self.mark_closed();
                return Err(e);
            }
        };
        let (sender, receiver) = match self.connector.connect().await {
            Ok(halves) => halves,
            Err(e) => {
                error!(error = %e, "cannot connect voice transport");
                self.mark_closed();
                return Err(e);
            }
        };

        let cancel = CancellationToken::new();
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        tokio::spawn(writer_loop(sender, out_rx, cancel.clone()));
        tokio::spawn(capture_loop(frames, out_tx.clone(), cancel.clone()));
        tokio::spawn(receive_loop(
            receiver,
            PlaybackScheduler::new(Arc::clone(&self.sink), self.playback_sample_rate),
            Arc::clone(&self.executor),
            out_tx,
            cancel.clone(),
            Arc::clone(&self.shared),
        ));

        let mut shared = lock(&self.shared);
        if cancel.is_cancelled() {
            // The receive loop already ended (e.g. instant remote close).
            shared.status = SessionStatus::Closed;
            shared.cancel = None;
        } else {
            shared.status = SessionStatus::Open;
            shared.cancel = Some(cancel);
            info!("voice session open");
        }
        Ok(())
    }

    /// Close the session. Capture stops and any scheduled playback is
    /// cancelled; nothing may sound after this returns.
    pub fn close(&self) {
        let token = {
            let mut shared = lock(&self.shared);
            shared.status = SessionStatus::Closed;
            shared.cancel.take()
        };
        if let Some(token) = token {
            token.cancel();
            info!("voice session closed");
        }
    }

    fn mark_closed(&self) {
        mark_closed(&self.shared);
    }
}

fn lock(shared: &Arc<Mutex<Shared>>) -> MutexGuard<'_, Shared> {
    match shared.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn mark_closed(shared: &Arc<Mutex<Shared>>) {
    let mut shared = lock(shared);
    shared.status = SessionStatus::Closed;
    shared.cancel = None;
}

/// Owns the transport's sending half; the capture and receive loops feed
/// it through a channel so sends never interleave.
async fn writer_loop(
    mut sender: Box<dyn VoiceSender>,
    mut out_rx: mpsc::UnboundedReceiver<ClientMessage>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            message = out_rx.recv() => {
                let Some(message) = message else { break };
                if let Err(e) = sender.send(message).await {
                    error!(error = %e, "voice send failed, ending session");
                    cancel.cancel();
                    break;
                }
            }
        }
    }
}

/// Encodes microphone frames onto the wire as they arrive.
async fn capture_loop(
    frames: mpsc::Receiver<Vec<f32>>,
    out_tx: mpsc::UnboundedSender<ClientMessage>,
    cancel: CancellationToken,
) {
    let mut frames = ReceiverStream::new(frames);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            frame = frames.next() => {
                let Some(frame) = frame else {
                    warn!("microphone stream ended, ending session");
                    cancel.cancel();
                    break;
                };
                let message = ClientMessage::Audio {
                    data: codec::encode_frame(&frame),
                };
                if out_tx.send(message).is_err() {
                    break;
                }
            }
        }
    }
}

/// Consumes inbound messages: schedules playback, answers tool calls,
/// honors interruptions. Exits on cancellation, remote close, or a fatal
/// error — always stopping playback on the way out.
async fn receive_loop(
    mut receiver: Box<dyn VoiceReceiver>,
    mut scheduler: PlaybackScheduler,
    executor: Arc<ToolExecutor>,
    out_tx: mpsc::UnboundedSender<ClientMessage>,
    cancel: CancellationToken,
    shared: Arc<Mutex<Shared>>,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            message = receiver.recv() => {
                match message {
                    Some(ServerMessage::Audio { data }) => match codec::decode_chunk(&data) {
                        Ok(samples) => {
                            let _ = scheduler.schedule(samples);
                        }
                        Err(e) => warn!(error = %e, "skipping undecodable audio chunk"),
                    },
                    Some(ServerMessage::ToolCall { id, name, args }) => {
                        let outcome = executor.execute(&FunctionCall {
                            name: name.clone(),
                            args,
                        });
                        let reply = ClientMessage::ToolResult {
                            id,
                            name,
                            result: outcome.response_payload().to_owned(),
                        };
                        if out_tx.send(reply).is_err() {
                            break;
                        }
                    }
                    Some(ServerMessage::Interrupted) => scheduler.interrupt(),
                    Some(ServerMessage::Error { message }) => {
                        error!(detail = %message, "voice backend reported a fatal error");
                        break;
                    }
                    None => {
                        debug!("voice transport closed by remote");
                        break;
                    }
                }
            }
        }
    }
    scheduler.stop();
    cancel.cancel();
    mark_closed(&shared);
}

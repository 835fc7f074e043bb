//! Top-level assembly of the assistant.
//!
//! Wires the session store, tool executor, conversation controller and
//! voice session controller together so hosts only deal with one object.

use std::sync::Arc;

use crate::config::AssistantConfig;
use crate::conversation::{ConversationController, TurnOutcome};
use crate::error::Result;
use crate::markers::MarkerSynthesizer;
use crate::model::ModelClient;
use crate::state::{MapViewState, SessionStore};
use crate::tools::ToolExecutor;
use crate::tools::map_tools::builtin_registry;
use crate::voice::{CaptureSource, PlaybackSink, VoiceConnector, VoiceSessionController};

/// One user-facing assistant session: chat, voice, markers and map state.
pub struct Assistant {
    store: SessionStore,
    conversation: ConversationController,
    voice: VoiceSessionController,
}

impl Assistant {
    /// Assemble an assistant from its external collaborators.
    pub fn new(
        config: &AssistantConfig,
        client: Arc<dyn ModelClient>,
        connector: Arc<dyn VoiceConnector>,
        capture: Arc<dyn CaptureSource>,
        sink: Arc<dyn PlaybackSink>,
    ) -> Self {
        let store = SessionStore::with_map_view(MapViewState {
            zoom: config.map.default_zoom,
            center: config.map.default_center,
            ..MapViewState::default()
        });
        let executor = ToolExecutor::shared(builtin_registry(), store.clone());
        let conversation = ConversationController::new(
            client,
            store.clone(),
            Arc::clone(&executor),
            MarkerSynthesizer::new(&config.markers),
        );
        let voice = VoiceSessionController::new(
            connector,
            capture,
            sink,
            executor,
            config.audio.playback_sample_rate,
        );
        Self {
            store,
            conversation,
            voice,
        }
    }

    /// The shared session state.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// The chat turn controller.
    pub fn conversation(&self) -> &ConversationController {
        &self.conversation
    }

    /// The voice session controller.
    pub fn voice(&self) -> &VoiceSessionController {
        &self.voice
    }

    /// Run one chat turn.
    pub async fn submit(&self, input: &str) -> TurnOutcome {
        self.conversation.submit(input).await
    }

    /// Open the voice session.
    ///
    /// # Errors
    ///
    /// Returns an error when the microphone or voice transport cannot be
    /// acquired.
    pub async fn open_voice(&self) -> Result<()> {
        self.voice.open().await
    }

    /// Close the voice session.
    pub fn close_voice(&self) {
        self.voice.close();
    }

    /// Reset the session: closes any open voice session and clears the
    /// transcript, markers and pending input.
    pub fn reset(&self) {
        self.voice.close();
        self.store.reset();
    }
}

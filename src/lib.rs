//! Waypoint: conversational map assistant.
//!
//! A chat interface layered over a map view. Natural-language requests
//! are answered with text, map markers, and map-control actions; the core
//! of the crate is the reconciliation pipeline that turns an unstructured
//! model response (free text + grounding citations + tool calls) into a
//! consistent application state.
//!
//! # Architecture
//!
//! One turn flows through independent stages over a single state owner:
//! - **Conversation controller**: dispatches the turn to the model and
//!   applies the response atomically
//! - **Grounding extractor**: pulls `(uri, title)` citations from the
//!   raw response
//! - **Route parser**: mines labeled totals and numbered steps from the
//!   response text
//! - **Marker synthesizer**: turns citations into map markers with
//!   placeholder place data
//! - **Tool executor**: applies `update_map_view` / `set_map_layer` /
//!   `toggle_traffic` calls to the shared map view
//! - **Voice session**: a concurrent bidirectional audio stream feeding
//!   the same tool executor, with gapless playback scheduling and
//!   barge-in interruption

pub mod assistant;
pub mod audio;
pub mod config;
pub mod conversation;
pub mod error;
pub mod grounding;
pub mod markers;
pub mod model;
pub mod route;
pub mod state;
pub mod tools;
pub mod voice;

pub use assistant::Assistant;
pub use config::AssistantConfig;
pub use conversation::{ConversationController, FAILURE_MESSAGE, TurnOutcome};
pub use error::{AssistantError, Result};
pub use grounding::GroundingLink;
pub use markers::{MapMarker, MarkerSynthesizer};
pub use route::{RouteParser, RouteStep, RouteSummary};
pub use state::{ChatMessage, ChatRole, LatLng, MapLayer, MapViewState, SessionStore};
pub use tools::{ToolExecutor, ToolOutcome};
pub use voice::{SessionStatus, VoiceSessionController};

//! Map-control tools callable by the model.
//!
//! The model may embed structured function calls in a response; each call
//! names one of the tools declared here and carries a JSON arguments
//! object. Tools mutate the shared map view state idempotently and answer
//! with a fixed acknowledgement string — on the voice channel that string
//! doubles as the correlated tool response payload.

pub mod executor;
pub mod map_tools;
pub mod registry;

pub use executor::{ToolExecutor, ToolOutcome};
pub use registry::ToolRegistry;

use crate::state::MapViewState;

/// A tool that applies a map-side effect.
pub trait MapTool: Send + Sync {
    /// The declared tool name.
    fn name(&self) -> &str;

    /// Human-readable description sent to the model.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's parameters.
    fn schema(&self) -> serde_json::Value;

    /// Fixed acknowledgement string returned to the caller.
    fn ack(&self) -> &str;

    /// Apply the call against the map view state.
    ///
    /// Must be idempotent and must not fail: malformed or missing argument
    /// fields leave the corresponding state untouched.
    fn apply(&self, args: &serde_json::Value, view: &mut MapViewState);
}

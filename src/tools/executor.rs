//! Tool-call dispatch against the shared session state.
//!
//! Both call sources — chat turns and the streaming voice session — feed
//! the same executor, so every viewport mutation goes through the single
//! state owner regardless of origin.

use std::sync::Arc;

use super::registry::ToolRegistry;
use crate::model::FunctionCall;
use crate::state::SessionStore;

/// Result of dispatching one tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    /// The tool was found and applied; carries its acknowledgement string.
    Applied {
        /// Fixed acknowledgement returned to the caller.
        ack: String,
    },
    /// The call named no registered tool and was skipped.
    ///
    /// Unknown names are expected from newer models and never fail the
    /// turn.
    Ignored,
}

impl ToolOutcome {
    /// The response payload for the voice channel's correlated reply.
    pub fn response_payload(&self) -> &str {
        match self {
            Self::Applied { ack } => ack,
            Self::Ignored => "ok",
        }
    }
}

/// Dispatches function calls from model responses to registered tools.
pub struct ToolExecutor {
    registry: ToolRegistry,
    store: SessionStore,
}

impl ToolExecutor {
    /// Create an executor over the given registry and state store.
    pub fn new(registry: ToolRegistry, store: SessionStore) -> Self {
        Self { registry, store }
    }

    /// Shared constructor used by both call sources.
    pub fn shared(registry: ToolRegistry, store: SessionStore) -> Arc<Self> {
        Arc::new(Self::new(registry, store))
    }

    /// Tool declarations for the model request.
    pub fn declarations(&self) -> Vec<crate::model::ToolDefinition> {
        self.registry.declarations()
    }

    /// Execute one call. Never fails: unknown tool names are ignored and
    /// malformed arguments leave state untouched.
    pub fn execute(&self, call: &FunctionCall) -> ToolOutcome {
        let Some(tool) = self.registry.get(&call.name) else {
            tracing::debug!(tool = %call.name, "ignoring unknown tool call");
            return ToolOutcome::Ignored;
        };
        self.store
            .update_map_view(|view| tool.apply(&call.args, view));
        tracing::debug!(tool = %call.name, "applied tool call");
        ToolOutcome::Applied {
            ack: tool.ack().to_owned(),
        }
    }
}

//! Model provider interface.
//!
//! Defines the provider-neutral [`ModelClient`] trait plus the request and
//! response types exchanged with the language-model backend. The backend is
//! an external service: this crate only shapes requests (prior turns, the
//! new prompt, a location bias, tool declarations) and consumes responses
//! (text, grounding citations, function calls).

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::state::LatLng;

/// Grounding source requested with every chat turn.
pub const GROUNDING_SOURCE_MAPS: &str = "maps";

/// The role of a prior turn sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// User input.
    User,
    /// Assistant (model) output.
    Assistant,
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One prior conversation turn, role-mapped for the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnMessage {
    /// Who produced the turn.
    pub role: TurnRole,
    /// The turn's text content.
    pub text: String,
}

impl TurnMessage {
    /// Create a turn message.
    pub fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

/// A tool declaration provided to the model for function calling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name (e.g. `"update_map_view"`).
    pub name: String,
    /// Human-readable description of the tool's purpose.
    pub description: String,
    /// JSON Schema describing the tool's parameters.
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new tool definition.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A chat-turn request to the model provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRequest {
    /// Prior conversation turns, oldest first.
    pub prior_turns: Vec<TurnMessage>,
    /// The new user prompt.
    pub prompt: String,
    /// Optional location bias hint (user's current position).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_bias: Option<LatLng>,
    /// Tools available to the model this turn.
    pub tools: Vec<ToolDefinition>,
    /// Grounding source identifier (always `"maps"`).
    pub grounding_source: String,
}

/// A structured function call embedded in a model response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// The declared tool name being invoked.
    pub name: String,
    /// Arguments object as provided by the model.
    #[serde(default)]
    pub args: serde_json::Value,
}

/// A single citation source reference in grounding metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Source URI.
    #[serde(default)]
    pub uri: String,
    /// Source display title.
    #[serde(default)]
    pub title: String,
}

/// One grounding chunk attached to a response.
///
/// A chunk cites either a web page or a maps place; providers populate
/// whichever field applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    /// Web source citation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<SourceRef>,
    /// Maps place citation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps: Option<SourceRef>,
}

/// Grounding metadata attached to a model response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingMetadata {
    /// Citation chunks in the model's citation order.
    #[serde(default)]
    pub chunks: Vec<GroundingChunk>,
}

/// A raw response from the model provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelResponse {
    /// Response text (may start with a display directive).
    #[serde(default)]
    pub text: String,
    /// Structured function calls requested by the model.
    #[serde(default)]
    pub function_calls: Vec<FunctionCall>,
    /// Grounding citations, when the response is grounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding: Option<GroundingMetadata>,
}

/// Trait for model provider clients.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Returns the provider name (for logs).
    fn name(&self) -> &str;

    /// Send one chat turn and await the full response.
    ///
    /// # Errors
    ///
    /// Returns an error on any network or API failure. No retry is
    /// performed at this layer.
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse>;
}

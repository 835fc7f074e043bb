//! Chat turn orchestration.
//!
//! One [`ConversationController::submit`] call drives a full turn:
//! dispatch to the model, apply tool calls, parse route data, synthesize
//! markers, append transcript entries. The turn is atomic — a response is
//! either applied in full, or the transcript gains exactly the single
//! generic failure message — and the in-flight flag always returns to
//! cleared.

use std::sync::{Arc, Mutex};

use tracing::{debug, error};

use crate::grounding;
use crate::markers::MarkerSynthesizer;
use crate::model::{GROUNDING_SOURCE_MAPS, ModelClient, ModelRequest};
use crate::route::RouteParser;
use crate::state::{ChatMessage, LatLng, SessionStore};
use crate::tools::ToolExecutor;

/// The single non-technical message shown for any turn failure.
pub const FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Display directive the model may prepend to a response to ask the UI to
/// give the map full focus. Stripped before display; never shown.
pub const MAP_FOCUS_DIRECTIVE: &str = "[MAP_FOCUS]";

/// How a submit call was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The response was applied in full.
    Completed,
    /// The model call failed; the failure message was appended.
    Failed,
    /// Empty input or a turn already in flight — silently ignored.
    Rejected,
}

/// Orchestrates chat turns against the shared session state.
pub struct ConversationController {
    client: Arc<dyn ModelClient>,
    store: SessionStore,
    executor: Arc<ToolExecutor>,
    synthesizer: MarkerSynthesizer,
    parser: RouteParser,
    location_hint: Mutex<Option<LatLng>>,
}

impl ConversationController {
    /// Create a controller.
    pub fn new(
        client: Arc<dyn ModelClient>,
        store: SessionStore,
        executor: Arc<ToolExecutor>,
        synthesizer: MarkerSynthesizer,
    ) -> Self {
        Self {
            client,
            store,
            executor,
            synthesizer,
            parser: RouteParser::new(),
            location_hint: Mutex::new(None),
        }
    }

    /// Set the user's current position, sent as a location bias hint with
    /// subsequent requests.
    pub fn set_location_hint(&self, position: Option<LatLng>) {
        match self.location_hint.lock() {
            Ok(mut hint) => *hint = position,
            Err(mut poisoned) => **poisoned.get_mut() = position,
        }
    }

    fn location_hint(&self) -> Option<LatLng> {
        match self.location_hint.lock() {
            Ok(hint) => *hint,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Run one chat turn.
    ///
    /// Never returns an error: model failures are absorbed into the
    /// transcript as the generic failure message, and invalid submits
    /// (empty input, turn already in flight) are silent no-ops.
    pub async fn submit(&self, input: &str) -> TurnOutcome {
        let input = input.trim();
        if input.is_empty() {
            debug!("ignoring empty submit");
            return TurnOutcome::Rejected;
        }
        let Some(prior_turns) = self.store.begin_turn(input) else {
            debug!("ignoring submit while a turn is in flight");
            return TurnOutcome::Rejected;
        };

        let request = ModelRequest {
            prior_turns,
            prompt: input.to_owned(),
            location_bias: self.location_hint(),
            tools: self.executor.declarations(),
            grounding_source: GROUNDING_SOURCE_MAPS.to_owned(),
        };

        match self.client.generate(&request).await {
            Ok(response) => {
                self.apply_response(response);
                TurnOutcome::Completed
            }
            Err(e) => {
                error!(provider = self.client.name(), error = %e, "model call failed");
                self.store.fail_turn(ChatMessage::assistant(FAILURE_MESSAGE));
                TurnOutcome::Failed
            }
        }
    }

    /// Apply a successful response: tool calls, then route parse, then
    /// marker synthesis, then the assistant transcript entry.
    fn apply_response(&self, response: crate::model::ModelResponse) {
        let (display_text, map_focused) = strip_display_directive(&response.text);
        if map_focused {
            self.store.set_map_focused(true);
        }

        for call in &response.function_calls {
            let _ = self.executor.execute(call);
        }

        let links = grounding::extract_links(&response);
        let route = self.parser.parse(&response.text, &links);

        let markers = if links.is_empty() {
            Vec::new()
        } else {
            let center = self.store.map_view().center;
            self.synthesizer.synthesize(&links, route.as_ref(), center)
        };

        let message = ChatMessage::assistant(display_text)
            .with_links(links)
            .with_route(route);
        self.store.complete_turn(message, markers);
    }
}

/// Strip the display directive from the start of response text, once.
///
/// Returns the display text and whether the directive was present.
fn strip_display_directive(text: &str) -> (String, bool) {
    let trimmed = text.trim_start();
    match trimmed.strip_prefix(MAP_FOCUS_DIRECTIVE) {
        Some(rest) => (rest.trim_start().to_owned(), true),
        None => (text.to_owned(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarkerConfig;
    use crate::error::AssistantError;
    use crate::model::{
        FunctionCall, GroundingChunk, GroundingMetadata, ModelResponse, SourceRef,
    };
    use crate::state::{ChatRole, MapLayer};
    use crate::tools::map_tools::builtin_registry;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Model client that replays scripted responses with a small delay.
    struct ScriptedClient {
        responses: Mutex<VecDeque<Result<ModelResponse, AssistantError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<ModelResponse, AssistantError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedClient {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(
            &self,
            _request: &ModelRequest,
        ) -> crate::error::Result<ModelResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            let next = match self.responses.lock() {
                Ok(mut responses) => responses.pop_front(),
                Err(poisoned) => poisoned.into_inner().pop_front(),
            };
            next.unwrap_or_else(|| Ok(ModelResponse::default()))
        }
    }

    fn controller_with(
        client: Arc<ScriptedClient>,
    ) -> (ConversationController, SessionStore) {
        let store = SessionStore::default();
        let executor = ToolExecutor::shared(builtin_registry(), store.clone());
        let controller = ConversationController::new(
            client,
            store.clone(),
            executor,
            MarkerSynthesizer::new(&MarkerConfig::default()),
        );
        (controller, store)
    }

    fn grounded_response(text: &str, titles: &[&str]) -> ModelResponse {
        ModelResponse {
            text: text.to_owned(),
            function_calls: Vec::new(),
            grounding: Some(GroundingMetadata {
                chunks: titles
                    .iter()
                    .map(|t| GroundingChunk {
                        maps: Some(SourceRef {
                            uri: format!("https://maps.example/{t}"),
                            title: (*t).to_owned(),
                        }),
                        web: None,
                    })
                    .collect(),
            }),
        }
    }

    // ── input rejection ───────────────────────────────────────

    #[tokio::test]
    async fn empty_and_whitespace_submits_are_rejected() {
        let client = ScriptedClient::new(Vec::new());
        let (controller, store) = controller_with(Arc::clone(&client));
        assert_eq!(controller.submit("").await, TurnOutcome::Rejected);
        assert_eq!(controller.submit("   \n").await, TurnOutcome::Rejected);
        assert_eq!(client.call_count(), 0);
        assert!(store.transcript().is_empty());
    }

    #[tokio::test]
    async fn concurrent_submit_makes_exactly_one_model_call() {
        let client = ScriptedClient::new(vec![Ok(ModelResponse::default())]);
        let (controller, _store) = controller_with(Arc::clone(&client));
        let (first, second) = tokio::join!(controller.submit("hello"), controller.submit("again"));
        assert_eq!(first, TurnOutcome::Completed);
        assert_eq!(second, TurnOutcome::Rejected);
        assert_eq!(client.call_count(), 1);
    }

    // ── turn failure ──────────────────────────────────────────

    #[tokio::test]
    async fn model_failure_appends_exactly_one_generic_message() {
        let client =
            ScriptedClient::new(vec![Err(AssistantError::Model("boom".to_owned()))]);
        let (controller, store) = controller_with(client);
        let outcome = controller.submit("plan a route").await;
        assert_eq!(outcome, TurnOutcome::Failed);

        let transcript = store.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].role, ChatRole::Assistant);
        assert_eq!(transcript[1].content, FAILURE_MESSAGE);
        assert_eq!(store.marker_count(), 0);
        assert!(!store.turn_in_flight());
    }

    // ── successful reconciliation ─────────────────────────────

    #[tokio::test]
    async fn successful_turn_applies_tools_route_markers_and_message() {
        let mut response = grounded_response(
            "Here's a route.\n1. Head north (0.2 mi)\n2. Arrive at Cafe\nTotal time: 10 mins.",
            &["Cafe", "Museum"],
        );
        response.function_calls = vec![FunctionCall {
            name: "set_map_layer".to_owned(),
            args: serde_json::json!({"layer": "transit"}),
        }];
        let client = ScriptedClient::new(vec![Ok(response)]);
        let (controller, store) = controller_with(client);

        let outcome = controller.submit("route with coffee").await;
        assert_eq!(outcome, TurnOutcome::Completed);

        assert_eq!(store.map_view().layer, MapLayer::Transit);
        assert_eq!(store.marker_count(), 2);

        let transcript = store.transcript();
        assert_eq!(transcript.len(), 2);
        let assistant = &transcript[1];
        assert_eq!(assistant.links.len(), 2);
        let route = assistant.route.clone();
        assert!(route.as_ref().is_some_and(|r| r.steps.len() == 2));
        assert_eq!(
            route.and_then(|r| r.duration).as_deref(),
            Some("10 mins")
        );

        let markers = store.markers();
        assert_eq!(markers[0].stop_number, Some(1));
        assert_eq!(markers[1].stop_number, Some(2));
    }

    #[tokio::test]
    async fn markers_accumulate_across_turns() {
        let client = ScriptedClient::new(vec![
            Ok(grounded_response("Two spots.", &["A", "B"])),
            Ok(grounded_response("Another.", &["C"])),
        ]);
        let (controller, store) = controller_with(client);
        let _ = controller.submit("first").await;
        let _ = controller.submit("second").await;
        // 2 + 1 markers, prior markers untouched
        assert_eq!(store.marker_count(), 3);
        let titles: Vec<String> = store.markers().into_iter().map(|m| m.title).collect();
        assert_eq!(titles, vec!["A".to_owned(), "B".to_owned(), "C".to_owned()]);
    }

    #[tokio::test]
    async fn unknown_tool_call_does_not_fail_the_turn() {
        let mut response = ModelResponse {
            text: "Done.".to_owned(),
            ..ModelResponse::default()
        };
        response.function_calls = vec![FunctionCall {
            name: "teleport_user".to_owned(),
            args: serde_json::json!({}),
        }];
        let client = ScriptedClient::new(vec![Ok(response)]);
        let (controller, store) = controller_with(client);
        let before = store.map_view();
        assert_eq!(controller.submit("go").await, TurnOutcome::Completed);
        assert_eq!(store.map_view(), before);
    }

    // ── display directive ─────────────────────────────────────

    #[tokio::test]
    async fn display_directive_is_stripped_and_toggles_flag() {
        let client = ScriptedClient::new(vec![Ok(ModelResponse {
            text: format!("{MAP_FOCUS_DIRECTIVE} Look at the map."),
            ..ModelResponse::default()
        })]);
        let (controller, store) = controller_with(client);
        let _ = controller.submit("show me").await;
        assert!(store.map_focused());
        let transcript = store.transcript();
        assert_eq!(transcript[1].content, "Look at the map.");
    }

    #[test]
    fn directive_is_stripped_exactly_once() {
        let (text, focused) =
            strip_display_directive("[MAP_FOCUS] [MAP_FOCUS] twice");
        assert!(focused);
        assert_eq!(text, "[MAP_FOCUS] twice");

        let (text, focused) = strip_display_directive("no directive here");
        assert!(!focused);
        assert_eq!(text, "no directive here");
    }
}

//! Shared session state and its single owning store.
//!
//! All mutable session state — transcript, markers, map view, mode flags —
//! lives in one [`SessionStore`]. Both writers (the turn pipeline and the
//! voice session's tool dispatch) go through the store's methods, each of
//! which takes the internal lock exactly once, so concurrent sources can
//! never interleave partial updates.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::grounding::GroundingLink;
use crate::markers::MapMarker;
use crate::model::{TurnMessage, TurnRole};
use crate::route::RouteSummary;

/// A geographic coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl Default for LatLng {
    fn default() -> Self {
        Self { lat: 0.0, lng: 0.0 }
    }
}

/// Base map layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapLayer {
    /// Default road map.
    #[default]
    Standard,
    /// Satellite imagery.
    Satellite,
    /// Terrain shading.
    Terrain,
    /// Public transit overlay.
    Transit,
}

impl MapLayer {
    /// Parse a layer name as it appears in tool arguments.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "standard" => Some(Self::Standard),
            "satellite" => Some(Self::Satellite),
            "terrain" => Some(Self::Terrain),
            "transit" => Some(Self::Transit),
            _ => None,
        }
    }
}

/// Current map viewport and display state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapViewState {
    /// Zoom level (1–18).
    pub zoom: f64,
    /// Viewport center.
    pub center: LatLng,
    /// Active base layer.
    pub layer: MapLayer,
    /// Whether the traffic overlay is shown.
    pub traffic_enabled: bool,
}

impl Default for MapViewState {
    fn default() -> Self {
        Self {
            zoom: 12.0,
            center: LatLng::default(),
            layer: MapLayer::Standard,
            traffic_enabled: false,
        }
    }
}

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The user.
    User,
    /// The assistant.
    Assistant,
}

/// One transcript entry.
///
/// Messages are immutable once appended; insertion order is conversational
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message author.
    pub role: ChatRole,
    /// Display text (display directives already stripped).
    pub content: String,
    /// Grounding citations attached to this message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<GroundingLink>,
    /// Route summary parsed from this message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteSummary>,
}

impl ChatMessage {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            links: Vec::new(),
            route: None,
        }
    }

    /// Create a plain assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            links: Vec::new(),
            route: None,
        }
    }

    /// Attach grounding links.
    pub fn with_links(mut self, links: Vec<GroundingLink>) -> Self {
        self.links = links;
        self
    }

    /// Attach a route summary.
    pub fn with_route(mut self, route: Option<RouteSummary>) -> Self {
        self.route = route;
        self
    }

    fn turn_role(&self) -> TurnRole {
        match self.role {
            ChatRole::User => TurnRole::User,
            ChatRole::Assistant => TurnRole::Assistant,
        }
    }
}

/// The full mutable session state.
#[derive(Debug, Clone, Default)]
struct SessionState {
    transcript: Vec<ChatMessage>,
    markers: Vec<MapMarker>,
    map_view: MapViewState,
    /// Display-directive flag: the UI should give the map full focus.
    map_focused: bool,
    /// Pending text in the input box.
    input: String,
    /// True while a chat turn is in flight (doubles as the loading flag).
    turn_in_flight: bool,
}

/// Single owner of all session state.
///
/// Cheap to clone; clones share the same underlying state.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<SessionState>>,
}

impl SessionStore {
    /// Create a store with the given initial map view.
    pub fn with_map_view(map_view: MapViewState) -> Self {
        let store = Self::default();
        store.lock().map_view = map_view;
        store
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Begin a chat turn: append the optimistic user message and raise the
    /// in-flight flag.
    ///
    /// Returns the prior transcript role-mapped for the model request, or
    /// `None` when another turn is already in flight (the submit is a
    /// silent no-op, not queued).
    pub fn begin_turn(&self, user_text: &str) -> Option<Vec<TurnMessage>> {
        let mut state = self.lock();
        if state.turn_in_flight {
            return None;
        }
        let prior = state
            .transcript
            .iter()
            .map(|m| TurnMessage::new(m.turn_role(), m.content.clone()))
            .collect();
        state.transcript.push(ChatMessage::user(user_text));
        state.input.clear();
        state.turn_in_flight = true;
        Some(prior)
    }

    /// Complete a turn: append the assistant message and this turn's
    /// markers, then clear the in-flight flag.
    pub fn complete_turn(&self, message: ChatMessage, markers: Vec<MapMarker>) {
        let mut state = self.lock();
        state.transcript.push(message);
        state.markers.extend(markers);
        state.turn_in_flight = false;
    }

    /// Fail a turn: append the single failure message and clear the
    /// in-flight flag. No other state from the turn is retained.
    pub fn fail_turn(&self, message: ChatMessage) {
        let mut state = self.lock();
        state.transcript.push(message);
        state.turn_in_flight = false;
    }

    /// Run a closure against the map view state under the store lock.
    ///
    /// This is the only mutation path for the viewport, shared by tool
    /// calls from both the chat turn pipeline and the voice session.
    pub fn update_map_view<R>(&self, f: impl FnOnce(&mut MapViewState) -> R) -> R {
        let mut state = self.lock();
        f(&mut state.map_view)
    }

    /// Apply an explicit style edit to an existing marker.
    ///
    /// Returns false when no marker has the given id. Style edits are the
    /// only permitted mutation of appended markers.
    pub fn set_marker_style(&self, marker_id: &str, color: Option<&str>, icon: Option<&str>) -> bool {
        let mut state = self.lock();
        let Some(marker) = state.markers.iter_mut().find(|m| m.id == marker_id) else {
            return false;
        };
        if let Some(color) = color {
            marker.color = color.to_owned();
        }
        if let Some(icon) = icon {
            marker.icon = icon.to_owned();
        }
        true
    }

    /// Set the map-focused display flag.
    pub fn set_map_focused(&self, focused: bool) {
        self.lock().map_focused = focused;
    }

    /// Replace the pending input text.
    pub fn set_input(&self, text: impl Into<String>) {
        self.lock().input = text.into();
    }

    /// Reset the session: clears transcript, markers and input, and
    /// restores the map-focused flag. The map view itself is kept — the
    /// user's viewport survives a conversation reset.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.transcript.clear();
        state.markers.clear();
        state.input.clear();
        state.map_focused = false;
        state.turn_in_flight = false;
    }

    // ── snapshots ─────────────────────────────────────────────

    /// Snapshot of the transcript.
    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.lock().transcript.clone()
    }

    /// Snapshot of all markers.
    pub fn markers(&self) -> Vec<MapMarker> {
        self.lock().markers.clone()
    }

    /// Number of markers currently held.
    pub fn marker_count(&self) -> usize {
        self.lock().markers.len()
    }

    /// Snapshot of the map view.
    pub fn map_view(&self) -> MapViewState {
        self.lock().map_view.clone()
    }

    /// Whether a chat turn is currently in flight.
    pub fn turn_in_flight(&self) -> bool {
        self.lock().turn_in_flight
    }

    /// Whether the UI should give the map full focus.
    pub fn map_focused(&self) -> bool {
        self.lock().map_focused
    }

    /// Pending input text.
    pub fn input(&self) -> String {
        self.lock().input.clone()
    }

    /// The active route: the most recent message carrying a non-empty
    /// route, scanning backward.
    pub fn active_route(&self) -> Option<RouteSummary> {
        let state = self.lock();
        state
            .transcript
            .iter()
            .rev()
            .find_map(|m| m.route.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── turn lifecycle ────────────────────────────────────────

    #[test]
    fn begin_turn_appends_user_message_and_sets_flag() {
        let store = SessionStore::default();
        let prior = store.begin_turn("hello");
        assert!(prior.is_some());
        assert_eq!(prior.unwrap_or_default().len(), 0);
        assert!(store.turn_in_flight());
        let transcript = store.transcript();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].role, ChatRole::User);
        assert_eq!(transcript[0].content, "hello");
    }

    #[test]
    fn begin_turn_rejected_while_in_flight() {
        let store = SessionStore::default();
        assert!(store.begin_turn("first").is_some());
        assert!(store.begin_turn("second").is_none());
        assert_eq!(store.transcript().len(), 1);
    }

    #[test]
    fn begin_turn_reports_prior_transcript_without_new_message() {
        let store = SessionStore::default();
        let _ = store.begin_turn("one");
        store.complete_turn(ChatMessage::assistant("reply"), Vec::new());
        let prior = store.begin_turn("two").unwrap_or_default();
        assert_eq!(prior.len(), 2);
        assert_eq!(prior[0].role, TurnRole::User);
        assert_eq!(prior[1].role, TurnRole::Assistant);
    }

    #[test]
    fn complete_turn_clears_flag_and_appends() {
        let store = SessionStore::default();
        let _ = store.begin_turn("hi");
        store.complete_turn(ChatMessage::assistant("hello"), Vec::new());
        assert!(!store.turn_in_flight());
        assert_eq!(store.transcript().len(), 2);
    }

    #[test]
    fn fail_turn_adds_single_message_and_clears_flag() {
        let store = SessionStore::default();
        let _ = store.begin_turn("hi");
        store.fail_turn(ChatMessage::assistant("Something went wrong."));
        assert!(!store.turn_in_flight());
        assert_eq!(store.transcript().len(), 2);
        assert_eq!(store.marker_count(), 0);
    }

    // ── map view and markers ──────────────────────────────────

    #[test]
    fn update_map_view_applies_closure() {
        let store = SessionStore::default();
        store.update_map_view(|view| view.zoom = 15.0);
        assert_eq!(store.map_view().zoom, 15.0);
    }

    #[test]
    fn marker_style_edit_only_touches_named_marker() {
        let store = SessionStore::default();
        let _ = store.begin_turn("go");
        let mut marker = MapMarker::for_test("marker-1-0", "A");
        marker.color = "#336699".to_owned();
        let other = MapMarker::for_test("marker-1-1", "B");
        let original_color = other.color.clone();
        store.complete_turn(ChatMessage::assistant("ok"), vec![marker, other]);

        assert!(store.set_marker_style("marker-1-0", Some("#ff0000"), None));
        let markers = store.markers();
        assert_eq!(markers[0].color, "#ff0000");
        assert_eq!(markers[1].color, original_color);
    }

    #[test]
    fn set_marker_style_unknown_id_is_false() {
        let store = SessionStore::default();
        assert!(!store.set_marker_style("nope", Some("#fff"), None));
    }

    // ── active route ──────────────────────────────────────────

    #[test]
    fn active_route_is_most_recent_route_bearing_message() {
        let store = SessionStore::default();
        let older = RouteSummary {
            stops: vec!["A".to_owned()],
            steps: Vec::new(),
            duration: None,
            distance: None,
        };
        let newer = RouteSummary {
            stops: vec!["B".to_owned()],
            steps: Vec::new(),
            duration: None,
            distance: None,
        };
        let _ = store.begin_turn("one");
        store.complete_turn(
            ChatMessage::assistant("r1").with_route(Some(older)),
            Vec::new(),
        );
        let _ = store.begin_turn("two");
        store.complete_turn(
            ChatMessage::assistant("r2").with_route(Some(newer)),
            Vec::new(),
        );
        let _ = store.begin_turn("three");
        store.complete_turn(ChatMessage::assistant("no route"), Vec::new());

        let active = store.active_route();
        assert_eq!(active.map(|r| r.stops), Some(vec!["B".to_owned()]));
    }

    // ── reset ─────────────────────────────────────────────────

    #[test]
    fn reset_clears_conversation_but_keeps_viewport() {
        let store = SessionStore::default();
        store.update_map_view(|view| view.zoom = 16.0);
        store.set_input("half-typed");
        store.set_map_focused(true);
        let _ = store.begin_turn("hello");
        store.complete_turn(
            ChatMessage::assistant("hi"),
            vec![MapMarker::for_test("marker-1-0", "A")],
        );

        store.reset();

        assert!(store.transcript().is_empty());
        assert_eq!(store.marker_count(), 0);
        assert!(store.input().is_empty());
        assert!(!store.map_focused());
        assert!(!store.turn_in_flight());
        assert_eq!(store.map_view().zoom, 16.0);
    }

    #[test]
    fn map_layer_parse() {
        assert_eq!(MapLayer::parse("satellite"), Some(MapLayer::Satellite));
        assert_eq!(MapLayer::parse(" Transit "), Some(MapLayer::Transit));
        assert_eq!(MapLayer::parse("hybrid"), None);
    }
}

//! The built-in map-control tools.
//!
//! Tool names and parameter schemas are part of the model contract and
//! must match the declarations the model was trained against.

use serde_json::json;

use super::MapTool;
use super::registry::ToolRegistry;
use crate::state::{MapLayer, MapViewState};

/// Zoom bounds accepted by `update_map_view`.
const MIN_ZOOM: f64 = 1.0;
const MAX_ZOOM: f64 = 18.0;

/// Registry preloaded with all built-in map tools.
pub fn builtin_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(UpdateMapView));
    registry.register(Box::new(SetMapLayer));
    registry.register(Box::new(ToggleTraffic));
    registry
}

/// `update_map_view{zoom?, latitude?, longitude?}` — partial viewport
/// update. Absent fields leave the corresponding dimension unchanged.
pub struct UpdateMapView;

impl MapTool for UpdateMapView {
    fn name(&self) -> &str {
        "update_map_view"
    }

    fn description(&self) -> &str {
        "Move or zoom the map view. Any omitted field keeps its current value."
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "zoom": {
                    "type": "number",
                    "minimum": 1,
                    "maximum": 18,
                    "description": "Zoom level between 1 and 18."
                },
                "latitude": { "type": "number" },
                "longitude": { "type": "number" }
            }
        })
    }

    fn ack(&self) -> &str {
        "Map view updated."
    }

    fn apply(&self, args: &serde_json::Value, view: &mut MapViewState) {
        if let Some(zoom) = args.get("zoom").and_then(serde_json::Value::as_f64) {
            view.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
        if let Some(lat) = args.get("latitude").and_then(serde_json::Value::as_f64) {
            view.center.lat = lat;
        }
        if let Some(lng) = args.get("longitude").and_then(serde_json::Value::as_f64) {
            view.center.lng = lng;
        }
    }
}

/// `set_map_layer{layer}` — switch the base layer.
pub struct SetMapLayer;

impl MapTool for SetMapLayer {
    fn name(&self) -> &str {
        "set_map_layer"
    }

    fn description(&self) -> &str {
        "Switch the base map layer."
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "layer": {
                    "type": "string",
                    "enum": ["standard", "satellite", "terrain", "transit"]
                }
            },
            "required": ["layer"]
        })
    }

    fn ack(&self) -> &str {
        "Map layer updated."
    }

    fn apply(&self, args: &serde_json::Value, view: &mut MapViewState) {
        let Some(layer) = args
            .get("layer")
            .and_then(serde_json::Value::as_str)
            .and_then(MapLayer::parse)
        else {
            tracing::debug!("set_map_layer called without a recognizable layer");
            return;
        };
        view.layer = layer;
    }
}

/// `toggle_traffic{enabled}` — show or hide the traffic overlay.
pub struct ToggleTraffic;

impl MapTool for ToggleTraffic {
    fn name(&self) -> &str {
        "toggle_traffic"
    }

    fn description(&self) -> &str {
        "Show or hide the live traffic overlay."
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "enabled": { "type": "boolean" }
            },
            "required": ["enabled"]
        })
    }

    fn ack(&self) -> &str {
        "Traffic view updated."
    }

    fn apply(&self, args: &serde_json::Value, view: &mut MapViewState) {
        let Some(enabled) = args.get("enabled").and_then(serde_json::Value::as_bool) else {
            tracing::debug!("toggle_traffic called without a boolean 'enabled'");
            return;
        };
        view.traffic_enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::LatLng;

    #[test]
    fn update_map_view_partial_update_keeps_other_dimensions() {
        let mut view = MapViewState {
            zoom: 10.0,
            center: LatLng { lat: 1.0, lng: 2.0 },
            ..MapViewState::default()
        };
        UpdateMapView.apply(&json!({"zoom": 14}), &mut view);
        assert_eq!(view.zoom, 14.0);
        assert_eq!(view.center, LatLng { lat: 1.0, lng: 2.0 });

        UpdateMapView.apply(&json!({"latitude": 48.85, "longitude": 2.35}), &mut view);
        assert_eq!(view.zoom, 14.0);
        assert_eq!(
            view.center,
            LatLng {
                lat: 48.85,
                lng: 2.35
            }
        );
    }

    #[test]
    fn update_map_view_clamps_zoom() {
        let mut view = MapViewState::default();
        UpdateMapView.apply(&json!({"zoom": 25}), &mut view);
        assert_eq!(view.zoom, 18.0);
        UpdateMapView.apply(&json!({"zoom": 0}), &mut view);
        assert_eq!(view.zoom, 1.0);
    }

    #[test]
    fn update_map_view_empty_args_is_a_no_op() {
        let mut view = MapViewState::default();
        let before = view.clone();
        UpdateMapView.apply(&json!({}), &mut view);
        assert_eq!(view, before);
    }

    #[test]
    fn set_map_layer_switches_layer() {
        let mut view = MapViewState::default();
        SetMapLayer.apply(&json!({"layer": "satellite"}), &mut view);
        assert_eq!(view.layer, MapLayer::Satellite);
    }

    #[test]
    fn set_map_layer_ignores_unknown_layer() {
        let mut view = MapViewState::default();
        SetMapLayer.apply(&json!({"layer": "hologram"}), &mut view);
        assert_eq!(view.layer, MapLayer::Standard);
        SetMapLayer.apply(&json!({}), &mut view);
        assert_eq!(view.layer, MapLayer::Standard);
    }

    #[test]
    fn toggle_traffic_sets_flag() {
        let mut view = MapViewState::default();
        ToggleTraffic.apply(&json!({"enabled": true}), &mut view);
        assert!(view.traffic_enabled);
        ToggleTraffic.apply(&json!({"enabled": false}), &mut view);
        assert!(!view.traffic_enabled);
    }

    #[test]
    fn toggle_traffic_without_flag_is_a_no_op() {
        let mut view = MapViewState::default();
        ToggleTraffic.apply(&json!({"enabled": "yes"}), &mut view);
        assert!(!view.traffic_enabled);
    }

    #[test]
    fn tools_are_idempotent() {
        let mut view = MapViewState::default();
        let args = json!({"zoom": 13, "latitude": 3.0, "longitude": 4.0});
        UpdateMapView.apply(&args, &mut view);
        let once = view.clone();
        UpdateMapView.apply(&args, &mut view);
        assert_eq!(view, once);
    }

    #[test]
    fn builtin_registry_declares_all_three_tools() {
        let registry = builtin_registry();
        let declarations = registry.declarations();
        let names: Vec<&str> = declarations.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["set_map_layer", "toggle_traffic", "update_map_view"]);
    }

    #[test]
    fn declared_schemas_mark_required_fields() {
        let registry = builtin_registry();
        for declaration in registry.declarations() {
            let required = declaration
                .parameters
                .get("required")
                .and_then(|r| r.as_array())
                .map(|r| r.len())
                .unwrap_or(0);
            match declaration.name.as_str() {
                "update_map_view" => assert_eq!(required, 0),
                "set_map_layer" | "toggle_traffic" => assert_eq!(required, 1),
                other => panic!("unexpected tool {other}"),
            }
        }
    }
}

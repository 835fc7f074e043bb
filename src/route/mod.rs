//! Route data derived from assistant responses.
//!
//! Routes are not authoritative: they are reconstructed heuristically from
//! free response text each turn by [`parser::RouteParser`]. A route exists
//! only when the evidence threshold is met (at least one parsed step, or at
//! least two grounding links).

pub mod parser;

pub use parser::RouteParser;

use serde::{Deserialize, Serialize};

/// Maneuver category inferred from a step's instruction text.
///
/// A classification, not a hard fact — the model does not structure this.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManeuverKind {
    /// Left turn.
    TurnLeft,
    /// Right turn.
    TurnRight,
    /// U-turn.
    UTurn,
    /// Merge onto a road.
    Merge,
    /// Take an exit or ramp.
    Exit,
    /// Continue straight / head in a direction.
    Straight,
    /// Arrival at a stop or the destination.
    Arrive,
    /// Unclassified instruction.
    #[default]
    Other,
}

impl ManeuverKind {
    /// Infer the maneuver category from an instruction.
    pub fn infer(instruction: &str) -> Self {
        let lower = instruction.to_ascii_lowercase();
        if lower.contains("u-turn") || lower.contains("uturn") {
            Self::UTurn
        } else if lower.contains("turn left") || lower.contains("left onto") {
            Self::TurnLeft
        } else if lower.contains("turn right") || lower.contains("right onto") {
            Self::TurnRight
        } else if lower.contains("merge") {
            Self::Merge
        } else if lower.contains("exit") || lower.contains("ramp") {
            Self::Exit
        } else if lower.contains("continue") || lower.contains("straight") || lower.contains("head")
        {
            Self::Straight
        } else if lower.contains("arrive") || lower.contains("destination") {
            Self::Arrive
        } else {
            Self::Other
        }
    }
}

/// One parsed route step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStep {
    /// Instruction text with any parenthesized distance stripped.
    pub instruction: String,
    /// Step distance as written in the text (e.g. `"0.4 mi"`), if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
    /// Inferred maneuver category.
    #[serde(default)]
    pub maneuver: ManeuverKind,
}

/// A route reconstructed from one assistant response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSummary {
    /// Stop names in citation order (link titles, not reordered by step
    /// content).
    pub stops: Vec<String>,
    /// Parsed steps in order of appearance.
    pub steps: Vec<RouteStep>,
    /// Total duration as written in the text, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Total distance as written in the text, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maneuver_inference_covers_common_phrasings() {
        assert_eq!(
            ManeuverKind::infer("Turn left onto Main St"),
            ManeuverKind::TurnLeft
        );
        assert_eq!(
            ManeuverKind::infer("Turn right at the lights"),
            ManeuverKind::TurnRight
        );
        assert_eq!(ManeuverKind::infer("Merge onto I-80"), ManeuverKind::Merge);
        assert_eq!(
            ManeuverKind::infer("Take exit 23 toward Oakland"),
            ManeuverKind::Exit
        );
        assert_eq!(
            ManeuverKind::infer("Continue on Broadway"),
            ManeuverKind::Straight
        );
        assert_eq!(
            ManeuverKind::infer("Head north on 5th Ave"),
            ManeuverKind::Straight
        );
        assert_eq!(
            ManeuverKind::infer("Arrive at Ferry Building"),
            ManeuverKind::Arrive
        );
        assert_eq!(
            ManeuverKind::infer("Make a U-turn at Oak St"),
            ManeuverKind::UTurn
        );
        assert_eq!(ManeuverKind::infer("Cross the bridge"), ManeuverKind::Other);
    }
}

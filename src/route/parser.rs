//! Rule-based route extraction from response text.
//!
//! The model is asked to format routes with labeled totals and a numbered
//! step list, but the text is still free-form. The parser scans for those
//! shapes explicitly: labeled values (`Total time: 45 mins`), numbered
//! lines (`1. Turn left…`), and parenthesized step distances (`(0.4 mi)`).
//! Every rule is a non-match-tolerant scan — the parser never fails, it
//! just yields fewer or no steps.

use crate::grounding::GroundingLink;
use crate::route::{ManeuverKind, RouteStep, RouteSummary};

/// Labels accepted for the route's total duration.
const DURATION_LABELS: &[&str] = &["total time", "duration", "estimated time"];

/// Labels accepted for the route's total distance.
const DISTANCE_LABELS: &[&str] = &["total distance", "distance"];

/// Extracts structured route data from assistant response text.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteParser;

impl RouteParser {
    /// Create a parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse route data from response text and the turn's grounding links.
    ///
    /// Returns `None` when the evidence threshold is not met: a route is
    /// accepted only with at least one parsed step or at least two links.
    /// Absence of a route is an expected outcome for non-routing answers,
    /// not an error.
    pub fn parse(&self, text: &str, links: &[GroundingLink]) -> Option<RouteSummary> {
        let steps = parse_steps(text);
        if steps.is_empty() && links.len() < 2 {
            return None;
        }
        Some(RouteSummary {
            stops: links.iter().map(|l| l.title.clone()).collect(),
            steps,
            duration: find_labeled_value(text, DURATION_LABELS),
            distance: find_labeled_value(text, DISTANCE_LABELS),
        })
    }
}

/// Find the first `<label>: <value>` occurrence for any of the given
/// labels (case-insensitive, longest label first) and return the trimmed
/// value.
///
/// The value ends at a line break, `!`, `?`, or a `.` that closes a
/// sentence (followed by whitespace or end of text) — a `.` inside a
/// number like `1.5 hours` does not terminate it.
fn find_labeled_value(text: &str, labels: &[&str]) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    let mut best: Option<usize> = None;
    let mut best_label_len = 0;
    for label in labels {
        let mut search_from = 0;
        while let Some(rel) = lower[search_from..].find(label) {
            let at = search_from + rel;
            if is_label_start(&lower, at) && colon_follows(&lower, at + label.len()) {
                let earlier = best.is_none_or(|b| at < b);
                if earlier || (best == Some(at) && label.len() > best_label_len) {
                    best = Some(at);
                    best_label_len = label.len();
                }
                break;
            }
            search_from = at + label.len();
        }
    }

    let at = best?;
    let after_label = at + best_label_len;
    let colon = lower[after_label..].find(':')? + after_label;
    let value_start = colon + 1;
    let value = capture_until_boundary(&text[value_start..]);
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

/// A label must start at the text start or after a non-alphanumeric
/// character, so `duration` does not match inside another word.
fn is_label_start(lower: &str, at: usize) -> bool {
    lower[..at]
        .chars()
        .next_back()
        .is_none_or(|c| !c.is_alphanumeric())
}

/// After the label, only spaces may precede the colon.
fn colon_follows(lower: &str, from: usize) -> bool {
    for c in lower[from..].chars() {
        match c {
            ' ' => continue,
            ':' => return true,
            _ => return false,
        }
    }
    false
}

/// Capture characters up to the first sentence or line boundary.
fn capture_until_boundary(rest: &str) -> &str {
    let mut chars = rest.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '\n' | '\r' | '!' | '?' => return &rest[..i],
            '.' => {
                let next = chars.peek().map(|(_, c)| *c);
                if next.is_none_or(char::is_whitespace) {
                    return &rest[..i];
                }
            }
            _ => {}
        }
    }
    rest
}

/// Scan for numbered list lines (`<integer>. <instruction>`) in order of
/// appearance.
fn parse_steps(text: &str) -> Vec<RouteStep> {
    text.lines().filter_map(parse_step_line).collect()
}

fn parse_step_line(line: &str) -> Option<RouteStep> {
    let trimmed = line.trim_start();
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let rest = trimmed[digits..].strip_prefix('.')?;
    let instruction = rest.strip_prefix(' ')?.trim();
    if instruction.is_empty() {
        return None;
    }
    let (instruction, distance) = split_step_distance(instruction);
    Some(RouteStep {
        maneuver: ManeuverKind::infer(&instruction),
        instruction,
        distance,
    })
}

/// Extract a parenthesized `<number><space?><unit>` token as the step's
/// distance and strip the parenthetical from the instruction.
fn split_step_distance(instruction: &str) -> (String, Option<String>) {
    let mut search_from = 0;
    while let Some(rel) = instruction[search_from..].find('(') {
        let open = search_from + rel;
        let Some(len) = instruction[open + 1..].find(')') else {
            break;
        };
        let close = open + 1 + len;
        let inner = instruction[open + 1..close].trim();
        if is_distance_token(inner) {
            let mut stripped = String::with_capacity(instruction.len());
            stripped.push_str(instruction[..open].trim_end());
            let tail = instruction[close + 1..].trim_start();
            if !tail.is_empty() {
                stripped.push(' ');
                stripped.push_str(tail);
            }
            return (stripped, Some(inner.to_owned()));
        }
        search_from = close + 1;
    }
    (instruction.to_owned(), None)
}

/// A distance token is a number (optionally with one decimal point),
/// optionally a space, then a short alphabetic unit (`mi`, `km`, `ft`…).
fn is_distance_token(token: &str) -> bool {
    let mut chars = token.chars().peekable();
    let mut digits = 0;
    let mut dots = 0;
    while let Some(c) = chars.peek() {
        if c.is_ascii_digit() {
            digits += 1;
        } else if *c == '.' && dots == 0 && digits > 0 {
            dots += 1;
        } else {
            break;
        }
        let _ = chars.next();
    }
    if digits == 0 {
        return false;
    }
    if chars.peek() == Some(&' ') {
        let _ = chars.next();
    }
    let unit: String = chars.collect();
    !unit.is_empty() && unit.len() <= 10 && unit.chars().all(|c| c.is_ascii_alphabetic())
}

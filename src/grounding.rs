//! Grounding citation extraction.
//!
//! Pulls `(uri, title)` citation records out of a raw model response.
//! Citations are the only signal for "place mentioned": downstream, link
//! titles become route stops and marker titles. Extraction preserves the
//! model's citation order and performs no deduplication — duplicates are
//! meaningful to stop numbering and pass through as-is.

use serde::{Deserialize, Serialize};

use crate::model::{GroundingChunk, ModelResponse, SourceRef};

/// A citation attached to an assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingLink {
    /// Source URI.
    pub uri: String,
    /// Source display title. Not guaranteed unique; used as the join key
    /// to route stops.
    pub title: String,
}

/// Extract grounding links from a raw model response.
///
/// Walks the response's grounding chunks in order. A chunk citing a maps
/// place wins over its web citation; chunks citing neither are skipped.
/// Returns an empty list when no grounding metadata is present — absence
/// is never an error.
pub fn extract_links(response: &ModelResponse) -> Vec<GroundingLink> {
    let Some(metadata) = &response.grounding else {
        return Vec::new();
    };
    metadata.chunks.iter().filter_map(link_from_chunk).collect()
}

fn link_from_chunk(chunk: &GroundingChunk) -> Option<GroundingLink> {
    let source = chunk.maps.as_ref().or(chunk.web.as_ref())?;
    link_from_source(source)
}

fn link_from_source(source: &SourceRef) -> Option<GroundingLink> {
    if source.uri.is_empty() && source.title.is_empty() {
        return None;
    }
    // A citation without a title still names a place on the wire; fall
    // back to the URI so the record stays renderable.
    let title = if source.title.is_empty() {
        source.uri.clone()
    } else {
        source.title.clone()
    };
    Some(GroundingLink {
        uri: source.uri.clone(),
        title,
    })
}

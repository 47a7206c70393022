//! Source resolution
//!
//! Builds the ordered list of candidate download sources for an item's PDF
//! attachment. The priority order is fixed:
//!
//! 1. Primary storage (the attachment's managed copy)
//! 2. The direct URL the attachment was registered with, for externally
//!    linked files
//! 3. An open-access mirror, looked up by the parent item's DOI
//!
//! An empty list is a normal outcome for incomplete metadata, never an error.

use crate::library::Item;
use crate::types::{CandidateSource, SourceKind};

/// Link modes that indicate the attachment points at an external file rather
/// than an uploaded copy
const EXTERNAL_LINK_MODES: [&str; 2] = ["imported_url", "linked_url"];

/// Build the ordered candidate list for an attachment
///
/// `item` is the parent bibliographic record (source of the DOI),
/// `attachment` the PDF child record (source of storage key and direct URL).
pub fn resolve_candidates(item: &Item, attachment: &Item) -> Vec<CandidateSource> {
    let mut candidates = Vec::new();
    let mut priority = 0u8;

    if !attachment.key.is_empty() {
        candidates.push(CandidateSource {
            kind: SourceKind::PrimaryStorage,
            locator: attachment.key.clone(),
            priority,
        });
        priority += 1;
    }

    let externally_linked = attachment
        .data
        .link_mode
        .as_deref()
        .is_some_and(|mode| EXTERNAL_LINK_MODES.contains(&mode));
    if externally_linked
        && let Some(url) = attachment.data.url.as_deref().filter(|u| !u.is_empty())
    {
        candidates.push(CandidateSource {
            kind: SourceKind::DirectUrl,
            locator: url.to_string(),
            priority,
        });
        priority += 1;
    }

    if let Some(doi) = item.data.doi.as_deref().filter(|d| !d.is_empty()) {
        candidates.push(CandidateSource {
            kind: SourceKind::OaMirror,
            locator: doi.to_string(),
            priority,
        });
    }

    candidates
}

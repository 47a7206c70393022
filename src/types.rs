//! Core types for refbundle

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The kind of download source a candidate points at
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// The library's managed storage backend (authenticated, may redirect to
    /// a time-limited signed URL)
    PrimaryStorage,
    /// A direct URL the attachment was registered with
    DirectUrl,
    /// An open-access mirror discovered through an index lookup by DOI
    OaMirror,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::PrimaryStorage => write!(f, "primary storage"),
            SourceKind::DirectUrl => write!(f, "direct URL"),
            SourceKind::OaMirror => write!(f, "open-access mirror"),
        }
    }
}

/// One candidate download location for an attachment
///
/// Immutable once built. Lower `priority` is tried first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSource {
    /// Which retrieval path this candidate uses
    pub kind: SourceKind,
    /// Kind-specific locator: attachment key, URL, or DOI
    pub locator: String,
    /// Position in the fallback order (0 = tried first)
    pub priority: u8,
}

/// Outcome of running the fallback chain over an item's candidate sources
///
/// Produced once per item and never mutated afterwards.
#[derive(Clone, Debug)]
pub enum FetchOutcome {
    /// Some candidate produced document bytes
    Fetched {
        /// The downloaded document content
        bytes: Vec<u8>,
        /// Which source kind ultimately succeeded
        source: SourceKind,
    },
    /// Every candidate failed (or there were none)
    Failed {
        /// Synthesized summary combining the per-source failure reasons
        reason: String,
    },
}

/// A successfully ingested document, attributed to exactly one chunk
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Title of the parent bibliographic item
    pub title: String,
    /// Number of pages the document contributed
    pub page_count: u32,
    /// Growth of the materialized chunk artifact caused by this document.
    ///
    /// Measured as the post-append artifact size minus the pre-append size,
    /// so it reflects genuine merge overhead (duplicate-resource removal and
    /// the like) rather than the raw input byte length.
    pub byte_size: u64,
    /// Index of the chunk this document was physically merged into
    pub chunk_index: u32,
}

/// A sealed output chunk
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkState {
    /// 1-based chunk index; indices are contiguous with no gaps
    pub index: u32,
    /// Materialized artifact size at seal time
    pub size_bytes: u64,
    /// Where the chunk artifact was written
    pub path: PathBuf,
    /// Documents merged into this chunk, in append order
    pub papers: Vec<PaperRecord>,
    /// Whether the chunk has been sealed (always true once emitted)
    pub sealed: bool,
}

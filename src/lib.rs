//! # refbundle
//!
//! Backend library for bulk PDF acquisition from reference-manager libraries.
//!
//! refbundle walks a collection in a Zotero-compatible library, downloads the
//! PDF for every item through a chain of fallback sources (managed storage,
//! the attachment's registered URL, an open-access mirror), and merges the
//! results into bookmarked, size-bounded bundle files. Per-item trouble is
//! recorded and skipped so one closed-access paper never sinks a run.
//!
//! ## Design Philosophy
//!
//! refbundle is designed to be:
//! - **Resilient** - Every download failure is recovered locally and reported
//! - **Size-aware** - Bundles roll over before hitting consumer file limits
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//!
//! ## Quick Start
//!
//! ```no_run
//! use refbundle::{CollectionBundler, Config, LibraryConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         library: LibraryConfig {
//!             library_id: "12345".to_string(),
//!             api_key: "your-api-key".to_string(),
//!             ..Default::default()
//!         },
//!         ..Default::default()
//!     };
//!
//!     let bundler = CollectionBundler::new(config)?;
//!     let outcome = bundler.run("TICS > s3:sci-insights > s3.3:social").await?;
//!     println!("{}", outcome.summary.render());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Size-bounded chunk aggregation
pub mod aggregator;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Multi-source document fetching
pub mod fetcher;
/// Library service client
pub mod library;
/// PDF merging with bookmarks
pub mod merge;
/// Open-access index client
pub mod oa;
/// Collection bundling pipeline
pub mod pipeline;
/// Run reporting
pub mod report;
/// Candidate source resolution
pub mod sources;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{BundleConfig, Config, FetchConfig, LibraryConfig, LibraryType};
pub use error::{Error, MergeError, Result};
pub use fetcher::Fetcher;
pub use library::{LibraryClient, find_pdf_attachment};
pub use merge::{MergeBackend, PdfMerger};
pub use pipeline::{BundleOutcome, CollectionBundler};
pub use report::{FailedPaper, FailureCategory, RunReport, RunSummary};
pub use sources::resolve_candidates;
pub use types::{CandidateSource, ChunkState, FetchOutcome, PaperRecord, SourceKind};

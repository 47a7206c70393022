//! Error types for refbundle
//!
//! This module provides the error handling for the library:
//! - A top-level [`Error`] covering configuration, network, I/O and service
//!   failures
//! - A nested [`MergeError`] for the PDF merge/measure backend, whose failures
//!   are fatal to a run segment (size-ceiling enforcement depends on accurate
//!   measurement)
//!
//! Per-source download failures are deliberately NOT represented here: they
//! are recovered locally inside the fetcher's fallback chain and surface only
//! as reason strings in the run report.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for refbundle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for refbundle
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "library.api_key")
        key: Option<String>,
    },

    /// Library service request failed (non-success status, bad payload)
    #[error("library API error: {0}")]
    Library(String),

    /// Open-access index request failed
    #[error("open-access index error: {0}")]
    OaIndex(String),

    /// Collection path could not be resolved — fatal before any fetching
    #[error("collection not found: {0}")]
    NotFound(String),

    /// Merge/measure backend error — fatal to the current run segment
    #[error("merge error: {0}")]
    Merge(#[from] MergeError),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// PDF merge/measure backend errors
#[derive(Debug, Error)]
pub enum MergeError {
    /// A document could not be parsed
    #[error("failed to load PDF '{label}': {reason}")]
    Load {
        /// Bookmark label of the document being appended
        label: String,
        /// The underlying parse failure
        reason: String,
    },

    /// A document parsed but contains no pages
    #[error("PDF '{label}' contains no pages")]
    NoPages {
        /// Bookmark label of the offending document
        label: String,
    },

    /// The combined artifact could not be materialized
    #[error("failed to write combined PDF to {path}: {reason}")]
    Write {
        /// Destination path of the chunk artifact
        path: PathBuf,
        /// The underlying write failure
        reason: String,
    },
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_error_converts_into_error() {
        let merge = MergeError::NoPages {
            label: "Some Paper".into(),
        };
        let err: Error = merge.into();
        assert!(matches!(err, Error::Merge(MergeError::NoPages { .. })));
        assert!(err.to_string().contains("Some Paper"));
    }

    #[test]
    fn io_error_converts_into_error() {
        let err: Error = std::io::Error::other("disk fail").into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn display_includes_context() {
        let err = Error::Config {
            message: "library_id must not be empty".into(),
            key: Some("library.library_id".into()),
        };
        assert_eq!(
            err.to_string(),
            "configuration error: library_id must not be empty"
        );

        let err = Error::NotFound("TICS>s3:sci-insights".into());
        assert_eq!(err.to_string(), "collection not found: TICS>s3:sci-insights");

        let err = Error::Merge(MergeError::Write {
            path: PathBuf::from("/out/papers_chunk2.pdf"),
            reason: "permission denied".into(),
        });
        assert!(err.to_string().contains("papers_chunk2.pdf"));
    }
}

//! Run reporting
//!
//! Accumulate-only record of what a run did: every successfully ingested
//! document with its chunk attribution, and every failed title with a reason
//! string. Finalizing produces per-chunk totals plus a failure-reason
//! histogram built by best-effort substring classification — failures are
//! never lost, at worst miscategorized into the "other" bucket.

use crate::types::{ChunkState, PaperRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// A document that could not be acquired
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedPaper {
    /// Title of the bibliographic item
    pub title: String,
    /// Why acquisition failed (synthesized per-source summary or a
    /// pipeline-level reason such as "no attachment found")
    pub reason: String,
}

/// Best-effort bucket for a failure reason
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// The host refused access (403 / forbidden)
    AccessForbidden,
    /// The content was missing, truncated or unparseable
    MalformedContent,
    /// Network-level trouble: timeouts, connection failures, proxies
    NetworkProxy,
    /// Anything the matcher did not recognize
    Other,
}

impl FailureCategory {
    /// Classify a failure reason by substring matching.
    ///
    /// Network patterns are checked after content patterns so a reason like
    /// "empty response body" is not swallowed by the broader network bucket.
    pub fn classify(reason: &str) -> Self {
        let lower = reason.to_lowercase();
        if lower.contains("403") || lower.contains("forbidden") {
            FailureCategory::AccessForbidden
        } else if lower.contains("eof")
            || lower.contains("malformed")
            || lower.contains("no pages")
            || lower.contains("empty response")
            || lower.contains("failed to load pdf")
        {
            FailureCategory::MalformedContent
        } else if lower.contains("proxy")
            || lower.contains("timed out")
            || lower.contains("timeout")
            || lower.contains("connection")
            || lower.contains("network")
        {
            FailureCategory::NetworkProxy
        } else {
            FailureCategory::Other
        }
    }
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureCategory::AccessForbidden => write!(f, "access forbidden"),
            FailureCategory::MalformedContent => write!(f, "malformed content"),
            FailureCategory::NetworkProxy => write!(f, "network/proxy"),
            FailureCategory::Other => write!(f, "other"),
        }
    }
}

/// Accumulates outcomes during a run; read-only once finalized
#[derive(Debug)]
pub struct RunReport {
    processed: Vec<PaperRecord>,
    failed: Vec<FailedPaper>,
    started_at: DateTime<Utc>,
}

impl RunReport {
    /// Start an empty report
    pub fn new() -> Self {
        Self {
            processed: Vec::new(),
            failed: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Record a successfully ingested document
    pub fn record_success(&mut self, record: PaperRecord) {
        self.processed.push(record);
    }

    /// Record a failed document
    pub fn record_failure(&mut self, title: impl Into<String>, reason: impl Into<String>) {
        self.failed.push(FailedPaper {
            title: title.into(),
            reason: reason.into(),
        });
    }

    /// Successfully processed documents so far
    pub fn processed(&self) -> &[PaperRecord] {
        &self.processed
    }

    /// Failed documents so far
    pub fn failed(&self) -> &[FailedPaper] {
        &self.failed
    }

    /// Close the report against the sealed chunks of the run
    pub fn finalize(self, chunks: Vec<ChunkState>) -> RunSummary {
        let mut failure_histogram = BTreeMap::new();
        for failure in &self.failed {
            *failure_histogram
                .entry(FailureCategory::classify(&failure.reason))
                .or_insert(0usize) += 1;
        }
        RunSummary {
            chunks,
            processed: self.processed,
            failed: self.failed,
            failure_histogram,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Finalized view of a run
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    /// Sealed chunks, in index order
    pub chunks: Vec<ChunkState>,
    /// Every successfully ingested document, in processing order
    pub processed: Vec<PaperRecord>,
    /// Every failed document, in processing order
    pub failed: Vec<FailedPaper>,
    /// Failure counts per best-effort category
    pub failure_histogram: BTreeMap<FailureCategory, usize>,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// Fraction of items that were successfully processed, in [0, 1].
    /// Returns 1.0 for a run that saw no items at all.
    pub fn success_rate(&self) -> f64 {
        let total = self.processed.len() + self.failed.len();
        if total == 0 {
            return 1.0;
        }
        self.processed.len() as f64 / total as f64
    }

    /// Total size of all sealed chunks
    pub fn total_size_bytes(&self) -> u64 {
        self.chunks.iter().map(|c| c.size_bytes).sum()
    }

    /// Render the human-readable run summary
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Processing summary");
        let _ = writeln!(out, "{}", "=".repeat(50));
        for chunk in &self.chunks {
            let _ = writeln!(
                out,
                "\nChunk {} ({:.1} MB, {} papers):",
                chunk.index,
                chunk.size_bytes as f64 / (1024.0 * 1024.0),
                chunk.papers.len()
            );
            for paper in &chunk.papers {
                let _ = writeln!(out, "- {}: {} pages", paper.title, paper.page_count);
            }
        }
        if !self.failed.is_empty() {
            let _ = writeln!(out, "\nFailed to process:");
            for failure in &self.failed {
                let _ = writeln!(out, "- {}: {}", failure.title, failure.reason);
            }
            let _ = writeln!(out, "\nFailure analysis:");
            for (category, count) in &self.failure_histogram {
                let _ = writeln!(out, "- {category}: {count} papers");
            }
        }
        let _ = writeln!(
            out,
            "\nSuccess rate: {:.1}% ({}/{})",
            self.success_rate() * 100.0,
            self.processed.len(),
            self.processed.len() + self.failed.len()
        );
        out
    }
}

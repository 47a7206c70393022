//! Size-bounded aggregation
//!
//! The aggregator owns the single open chunk at any point during a run and
//! implements the rollover state machine: append, materialize, measure, and
//! seal when the measured size reaches the ceiling. An item always belongs to
//! the chunk it was physically merged into, so the item that pushes a chunk
//! over the ceiling is a member of the chunk that gets sealed — content never
//! spans two chunks, and a single oversized item legitimately produces a
//! chunk above the ceiling.

use crate::error::Result;
use crate::merge::MergeBackend;
use crate::types::{ChunkState, PaperRecord};
use crate::utils::chunk_path;
use std::path::{Path, PathBuf};

/// Accumulates documents into size-bounded chunk artifacts
pub struct Aggregator {
    backend: Box<dyn MergeBackend>,
    /// Path the bundle would have as a single artifact, e.g.
    /// `/out/social_papers.pdf`; chunks derive their names from it
    base_path: PathBuf,
    ceiling: u64,
    /// Index of the currently open chunk (1-based)
    open_index: u32,
    /// Measured size of the open chunk after the last materialization
    open_size: u64,
    /// Members of the currently open chunk, in append order
    members: Vec<PaperRecord>,
    sealed: Vec<ChunkState>,
    rolled_over: bool,
}

impl Aggregator {
    /// Create an aggregator writing chunks derived from `base_path`, rolling
    /// over when a materialized artifact reaches `ceiling` bytes
    pub fn new(backend: Box<dyn MergeBackend>, base_path: PathBuf, ceiling: u64) -> Self {
        Self {
            backend,
            base_path,
            ceiling,
            open_index: 1,
            open_size: 0,
            members: Vec::new(),
            sealed: Vec::new(),
            rolled_over: false,
        }
    }

    fn open_path(&self) -> PathBuf {
        chunk_path(&self.base_path, self.open_index)
    }

    /// Append a document to the open chunk, rewrite and measure the chunk
    /// artifact, and roll over if the ceiling was reached.
    ///
    /// Returns the record the document was filed under; merge/measure
    /// failures are fatal to the run segment.
    pub fn ingest(&mut self, title: &str, pdf: &Path) -> Result<PaperRecord> {
        let page_count = self.backend.append(pdf, title)?;
        let path = self.open_path();
        let size = self.backend.write(&path)?;
        let contribution = size.saturating_sub(self.open_size);
        self.open_size = size;

        let record = PaperRecord {
            title: title.to_string(),
            page_count,
            byte_size: contribution,
            chunk_index: self.open_index,
        };
        self.members.push(record.clone());
        tracing::debug!(
            title,
            chunk = self.open_index,
            size_bytes = size,
            "appended document to chunk"
        );

        if size >= self.ceiling {
            tracing::info!(
                chunk = self.open_index,
                size_bytes = size,
                ceiling = self.ceiling,
                "size ceiling reached, sealing chunk"
            );
            self.seal_open(size, path);
            self.rolled_over = true;
        }
        Ok(record)
    }

    fn seal_open(&mut self, size: u64, path: PathBuf) {
        self.sealed.push(ChunkState {
            index: self.open_index,
            size_bytes: size,
            path,
            papers: std::mem::take(&mut self.members),
            sealed: true,
        });
        self.open_index += 1;
        self.open_size = 0;
        self.backend.reset();
    }

    /// Seal the final chunk (if it has members) and return all sealed chunks.
    ///
    /// An empty open chunk is discarded — nothing was ever materialized for
    /// it. When exactly one chunk was produced without any rollover, its
    /// artifact is renamed to the plain base path.
    pub fn finish(mut self) -> Result<Vec<ChunkState>> {
        if !self.members.is_empty() {
            let path = self.open_path();
            let size = self.open_size;
            self.seal_open(size, path);
        } else if self.open_index > 1 {
            tracing::debug!(
                chunk = self.open_index,
                "discarding empty trailing chunk"
            );
        }

        if self.sealed.len() == 1 && !self.rolled_over {
            let chunk = &mut self.sealed[0];
            std::fs::rename(&chunk.path, &self.base_path)?;
            chunk.path = self.base_path.clone();
        }
        Ok(self.sealed)
    }
}

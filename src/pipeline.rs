//! Collection bundling pipeline
//!
//! Ties the other modules together: resolve the collection, walk its items,
//! fetch each document through the fallback chain, feed successes into the
//! size-bounded aggregator, and close with a run report. Per-item trouble
//! (no attachment, every source failed, a broken child listing) is recorded
//! and skipped; only configuration, collection resolution, and artifact
//! write failures abort the run.

use crate::aggregator::Aggregator;
use crate::config::Config;
use crate::error::{Error, MergeError, Result};
use crate::fetcher::Fetcher;
use crate::library::{LibraryClient, find_pdf_attachment};
use crate::merge::PdfMerger;
use crate::report::{RunReport, RunSummary};
use crate::sources::resolve_candidates;
use crate::types::FetchOutcome;
use crate::utils::bundle_base_name;

/// Result of bundling one collection
#[derive(Debug)]
pub struct BundleOutcome {
    /// The `>`-separated collection path that was bundled
    pub collection: String,
    /// Finalized run report
    pub summary: RunSummary,
}

/// Drives a full bundling run against one library
pub struct CollectionBundler {
    config: Config,
    library: LibraryClient,
    fetcher: Fetcher,
}

impl CollectionBundler {
    /// Validate the configuration and build the service clients
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let library = LibraryClient::new(&config.library, config.fetch.request_timeout)?;
        let fetcher = Fetcher::new(&config)?;
        Ok(Self {
            config,
            library,
            fetcher,
        })
    }

    /// Bundle a single collection identified by a `>`-separated path
    ///
    /// An unresolvable path is fatal: there is nothing to bundle.
    pub async fn run(&self, collection_path: &str) -> Result<BundleOutcome> {
        let key = self
            .library
            .find_collection_path(collection_path)
            .await?
            .ok_or_else(|| Error::NotFound(format!("collection '{collection_path}'")))?;

        let base_name = bundle_base_name(collection_path, None);
        let summary = self.bundle_collection(&key, &base_name).await?;
        Ok(BundleOutcome {
            collection: collection_path.to_string(),
            summary,
        })
    }

    /// Bundle a collection and each of its direct subcollections as separate
    /// artifacts
    pub async fn run_recursive(&self, collection_path: &str) -> Result<Vec<BundleOutcome>> {
        let key = self
            .library
            .find_collection_path(collection_path)
            .await?
            .ok_or_else(|| Error::NotFound(format!("collection '{collection_path}'")))?;

        let mut outcomes = Vec::new();
        let base_name = bundle_base_name(collection_path, None);
        let summary = self.bundle_collection(&key, &base_name).await?;
        outcomes.push(BundleOutcome {
            collection: collection_path.to_string(),
            summary,
        });

        for sub in self.library.subcollections(&key).await? {
            let sub_name = bundle_base_name(collection_path, Some(&sub.data.name));
            let summary = self.bundle_collection(&sub.key, &sub_name).await?;
            outcomes.push(BundleOutcome {
                collection: format!("{collection_path} > {}", sub.data.name),
                summary,
            });
        }
        Ok(outcomes)
    }

    async fn bundle_collection(&self, collection_key: &str, base_name: &str) -> Result<RunSummary> {
        let base_path = self.config.bundle.output_dir.join(format!("{base_name}.pdf"));
        tracing::info!(collection = collection_key, output = %base_path.display(), "bundling collection");
        tokio::fs::create_dir_all(&self.config.bundle.output_dir).await?;

        let items = self.library.collection_items(collection_key).await?;
        let spool = tempfile::tempdir()?;
        let mut aggregator = Aggregator::new(
            Box::new(PdfMerger::new()),
            base_path,
            self.config.bundle.size_ceiling_bytes,
        );
        let mut report = RunReport::new();

        for item in items.iter().filter(|i| i.data.item_type != "attachment") {
            let title = item
                .data
                .title
                .clone()
                .unwrap_or_else(|| "Untitled".to_string());
            tracing::info!(%title, "processing item");

            let children = match self.library.children(&item.key).await {
                Ok(children) => children,
                Err(e) => {
                    report.record_failure(&title, format!("attachment listing failed: {e}"));
                    continue;
                }
            };
            let Some(attachment) = find_pdf_attachment(&children) else {
                report.record_failure(&title, "no attachment found");
                continue;
            };

            let candidates = resolve_candidates(item, attachment);
            match self.fetcher.fetch(&candidates).await {
                FetchOutcome::Fetched { bytes, source } => {
                    let spooled = spool.path().join(format!("{}.pdf", attachment.key));
                    tokio::fs::write(&spooled, &bytes).await?;
                    match aggregator.ingest(&title, &spooled) {
                        Ok(record) => {
                            tracing::info!(%title, %source, chunk = record.chunk_index, "added to bundle");
                            report.record_success(record);
                        }
                        Err(Error::Merge(
                            e @ (MergeError::Load { .. } | MergeError::NoPages { .. }),
                        )) => {
                            // A broken downloaded file must not sink the run;
                            // artifact write failures still do.
                            report.record_failure(&title, e.to_string());
                        }
                        Err(e) => return Err(e),
                    }
                }
                FetchOutcome::Failed { reason } => {
                    report.record_failure(&title, reason);
                }
            }
        }

        let chunks = aggregator.finish()?;
        let summary = report.finalize(chunks);
        tracing::info!("{}", summary.render());
        Ok(summary)
    }
}

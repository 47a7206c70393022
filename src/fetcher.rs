//! Multi-source document fetching
//!
//! Runs the fallback chain over an item's candidate sources: candidates are
//! tried strictly in priority order, the first success wins, and each source
//! gets at most one attempt per fetch. Per-source failures (network errors,
//! non-success statuses, missing headers) are caught locally, logged, and
//! folded into a synthesized reason string when every candidate fails — they
//! never abort the overall fetch, let alone the run.

use crate::config::{Config, normalized_url};
use crate::error::{Error, Result};
use crate::oa::OaIndexClient;
use crate::types::{CandidateSource, FetchOutcome, SourceKind};

/// API version header value for primary-storage requests
const API_VERSION: &str = "3";

/// Per-source failure: a plain reason string, recovered locally
type SourceResult = std::result::Result<Vec<u8>, String>;

/// Downloads documents by trying candidate sources in priority order
#[derive(Clone, Debug)]
pub struct Fetcher {
    /// Client with redirects disabled, for the signed-URL dance against
    /// primary storage
    storage_client: reqwest::Client,
    /// Client that follows redirects, for direct and mirror downloads
    client: reqwest::Client,
    /// Library base URL plus prefix, e.g. `https://host/users/12345`
    library_prefix: String,
    api_key: String,
    user_agent: String,
    oa: OaIndexClient,
}

impl Fetcher {
    /// Build a fetcher from the configuration
    pub fn new(config: &Config) -> Result<Self> {
        let timeout = config.fetch.request_timeout;
        let storage_client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| {
                Error::Io(std::io::Error::other(format!(
                    "failed to create HTTP client: {e}"
                )))
            })?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::Io(std::io::Error::other(format!(
                    "failed to create HTTP client: {e}"
                )))
            })?;
        let base = normalized_url(&config.library.base_url, "library.base_url")?;
        let oa = OaIndexClient::new(&config.fetch, client.clone())?;
        Ok(Self {
            storage_client,
            client,
            library_prefix: format!("{base}/{}", config.library.api_prefix()),
            api_key: config.library.api_key.clone(),
            user_agent: config.fetch.user_agent.clone(),
            oa,
        })
    }

    /// Try each candidate in priority order until bytes are obtained or the
    /// candidates are exhausted
    pub async fn fetch(&self, candidates: &[CandidateSource]) -> FetchOutcome {
        if candidates.is_empty() {
            return FetchOutcome::Failed {
                reason: "no candidate sources available".to_string(),
            };
        }

        let mut ordered: Vec<&CandidateSource> = candidates.iter().collect();
        ordered.sort_by_key(|c| c.priority);

        let mut reasons = Vec::with_capacity(ordered.len());
        for candidate in ordered {
            match self.attempt(candidate).await {
                Ok(bytes) => {
                    tracing::info!(
                        source = %candidate.kind,
                        bytes = bytes.len(),
                        "download succeeded"
                    );
                    return FetchOutcome::Fetched {
                        bytes,
                        source: candidate.kind,
                    };
                }
                Err(reason) => {
                    tracing::warn!(
                        source = %candidate.kind,
                        reason = %reason,
                        "source attempt failed, trying next candidate"
                    );
                    reasons.push(format!("{}: {reason}", candidate.kind));
                }
            }
        }

        FetchOutcome::Failed {
            reason: reasons.join("; "),
        }
    }

    async fn attempt(&self, candidate: &CandidateSource) -> SourceResult {
        let bytes = match candidate.kind {
            SourceKind::PrimaryStorage => self.fetch_primary(&candidate.locator).await?,
            SourceKind::DirectUrl => self.fetch_direct(&candidate.locator).await?,
            SourceKind::OaMirror => self.fetch_mirror(&candidate.locator).await?,
        };
        if bytes.is_empty() {
            return Err("empty response body".to_string());
        }
        Ok(bytes)
    }

    /// Authenticated storage request; a redirect carries a time-limited
    /// signed URL which is then fetched unauthenticated. A direct 200 is
    /// also accepted.
    async fn fetch_primary(&self, attachment_key: &str) -> SourceResult {
        let url = format!("{}/items/{attachment_key}/file", self.library_prefix);
        let response = self
            .storage_client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Zotero-API-Version", API_VERSION)
            .send()
            .await
            .map_err(describe_request_error)?;

        let status = response.status();
        if status.is_redirection() {
            let signed_url = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| "redirect without Location header".to_string())?
                .to_string();
            tracing::debug!("got signed URL from storage, downloading file");
            let file_response = self
                .client
                .get(&signed_url)
                .send()
                .await
                .map_err(describe_request_error)?;
            if !file_response.status().is_success() {
                return Err(format!(
                    "signed URL download returned status {}",
                    file_response.status()
                ));
            }
            return read_body(file_response).await;
        }

        if status.is_success() {
            return read_body(response).await;
        }
        Err(format!("storage request returned status {status}"))
    }

    /// Unauthenticated GET with a browser-like identification header,
    /// following redirects
    async fn fetch_direct(&self, url: &str) -> SourceResult {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(describe_request_error)?;
        if !response.status().is_success() {
            return Err(format!("download returned status {}", response.status()));
        }
        read_body(response).await
    }

    /// Open-access index lookup by DOI, then a GET against the best open
    /// location when one exists
    async fn fetch_mirror(&self, doi: &str) -> SourceResult {
        let record = self.oa.lookup(doi).await.map_err(|e| e.to_string())?;
        let Some(url) = record.best_url() else {
            return Err("no open-access copy available".to_string());
        };
        tracing::debug!(url, "found open-access location");
        self.fetch_direct(url).await
    }
}

async fn read_body(response: reqwest::Response) -> SourceResult {
    response
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(describe_request_error)
}

fn describe_request_error(e: reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {e}")
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    }
}

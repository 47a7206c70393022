//! Library service client
//!
//! A client for Zotero-compatible reference-manager APIs: collection listing
//! and path resolution, item listing, and attachment discovery. Every call is
//! authenticated with the configured bearer credential and pinned to a fixed
//! API version. The base URL is configurable so tests can point the client at
//! a mock server.

use crate::config::{LibraryConfig, normalized_url};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// API version header value sent with every request
const API_VERSION: &str = "3";

/// A collection (folder) in the library
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Collection {
    /// Stable collection identifier
    pub key: String,
    /// Collection payload
    pub data: CollectionData,
}

/// Payload of a collection record
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectionData {
    /// Human-readable collection name
    pub name: String,
}

/// A bibliographic item or attachment in the library
///
/// The library API uses the same record shape for top-level items and their
/// child attachments; which fields are populated depends on the record kind.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    /// Stable item identifier
    pub key: String,
    /// Item payload
    pub data: ItemData,
}

/// Payload of an item record
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemData {
    /// Record kind, e.g. "journalArticle" or "attachment"
    pub item_type: String,
    /// Item title
    pub title: Option<String>,
    /// Persistent document identifier, when the item carries one
    #[serde(rename = "DOI")]
    pub doi: Option<String>,
    /// MIME type (attachments only)
    pub content_type: Option<String>,
    /// How the attachment was registered, e.g. "imported_url" or "linked_url"
    pub link_mode: Option<String>,
    /// URL the attachment was registered with
    pub url: Option<String>,
    /// Attachment filename
    pub filename: Option<String>,
}

/// Client for the library REST API
#[derive(Clone, Debug)]
pub struct LibraryClient {
    client: reqwest::Client,
    /// Normalized base URL plus library prefix, e.g. `https://host/users/12345`
    prefix: String,
    api_key: String,
}

impl LibraryClient {
    /// Create a client from the library sub-config with the given per-request
    /// timeout
    pub fn new(config: &LibraryConfig, timeout: Duration) -> Result<Self> {
        let base = normalized_url(&config.base_url, "library.base_url")?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::Io(std::io::Error::other(format!(
                    "failed to create HTTP client: {e}"
                )))
            })?;
        Ok(Self {
            client,
            prefix: format!("{base}/{}", config.api_prefix()),
            api_key: config.api_key.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/{path}", self.prefix);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Zotero-API-Version", API_VERSION)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Library(format!("GET {url} returned {status}")));
        }
        Ok(response.json().await?)
    }

    /// List top-level collections in the library
    pub async fn collections(&self) -> Result<Vec<Collection>> {
        self.get_json("collections").await
    }

    /// List direct subcollections of a collection
    pub async fn subcollections(&self, collection_key: &str) -> Result<Vec<Collection>> {
        self.get_json(&format!("collections/{collection_key}/collections"))
            .await
    }

    /// Resolve a `>`-separated collection path to a collection key
    ///
    /// Each level is matched case-insensitively by name. Returns `None` when
    /// any level of the path cannot be found.
    pub async fn find_collection_path(&self, path: &str) -> Result<Option<String>> {
        let mut current: Option<String> = None;
        for name in path.split('>').map(str::trim) {
            let level = match &current {
                None => self.collections().await?,
                Some(key) => self.subcollections(key).await?,
            };
            match level
                .into_iter()
                .find(|c| c.data.name.eq_ignore_ascii_case(name))
            {
                Some(collection) => {
                    tracing::debug!(name, key = %collection.key, "resolved collection level");
                    current = Some(collection.key);
                }
                None => {
                    tracing::warn!(name, path, "collection level not found");
                    return Ok(None);
                }
            }
        }
        Ok(current)
    }

    /// List items in a collection (attachments included, as the API returns
    /// them — callers filter by `item_type`)
    pub async fn collection_items(&self, collection_key: &str) -> Result<Vec<Item>> {
        self.get_json(&format!("collections/{collection_key}/items"))
            .await
    }

    /// List child records (attachments, notes) of an item
    pub async fn children(&self, item_key: &str) -> Result<Vec<Item>> {
        self.get_json(&format!("items/{item_key}/children")).await
    }
}

/// Find the first child that looks like a PDF attachment
///
/// A child qualifies when its content type is `application/pdf`, or when it
/// is an attachment whose filename ends in `.pdf` (covers records with a
/// missing content type).
pub fn find_pdf_attachment(children: &[Item]) -> Option<&Item> {
    children.iter().find(|child| {
        child.data.content_type.as_deref() == Some("application/pdf")
            || (child.data.item_type == "attachment"
                && child
                    .data
                    .filename
                    .as_deref()
                    .is_some_and(|f| f.to_lowercase().ends_with(".pdf")))
    })
}

//! Open-access index client
//!
//! Looks up documents by DOI against an Unpaywall-style index and extracts
//! the best available open location, if any. Odd or partial responses are
//! tolerated; the caller treats a lookup failure as an ordinary per-source
//! failure.

use crate::config::{FetchConfig, normalized_url};
use crate::error::{Error, Result};
use serde::Deserialize;

/// Result of an open-access lookup
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct OaRecord {
    /// Whether an open-access copy of the document exists
    pub is_oa: bool,
    /// The best open location the index knows about
    pub best_oa_location: Option<OaLocation>,
}

impl OaRecord {
    /// URL of the best open-access copy, when one exists
    pub fn best_url(&self) -> Option<&str> {
        if !self.is_oa {
            return None;
        }
        self.best_oa_location
            .as_ref()
            .and_then(|loc| loc.url.as_deref())
            .filter(|url| !url.is_empty())
    }
}

/// One open-access location within a lookup result
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct OaLocation {
    /// Download URL for this location
    pub url: Option<String>,
}

/// Client for the open-access index
#[derive(Clone, Debug)]
pub struct OaIndexClient {
    client: reqwest::Client,
    base_url: String,
    email: Option<String>,
}

impl OaIndexClient {
    /// Create a client from the fetch sub-config, reusing the shared HTTP
    /// client (its timeout bounds every lookup)
    pub fn new(config: &FetchConfig, client: reqwest::Client) -> Result<Self> {
        Ok(Self {
            client,
            base_url: normalized_url(&config.oa_base_url, "fetch.oa_base_url")?,
            email: config.oa_email.clone(),
        })
    }

    /// Look up a document by DOI
    pub async fn lookup(&self, doi: &str) -> Result<OaRecord> {
        let mut url = format!("{}/v2/{}", self.base_url, urlencoding::encode(doi));
        if let Some(email) = &self.email {
            url.push_str(&format!("?email={}", urlencoding::encode(email)));
        }
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::OaIndex(format!("lookup for {doi} returned {status}")));
        }
        Ok(response.json().await?)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OaIndexClient {
        let config = FetchConfig {
            oa_base_url: server.uri(),
            oa_email: Some("team@example.org".into()),
            ..Default::default()
        };
        OaIndexClient::new(&config, reqwest::Client::new()).unwrap()
    }

    #[tokio::test]
    async fn lookup_parses_open_access_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/10.1000%2Fxyz123"))
            .and(query_param("email", "team@example.org"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "is_oa": true,
                "best_oa_location": {"url": "https://mirror.example.org/xyz123.pdf"}
            })))
            .mount(&server)
            .await;

        let record = client(&server).lookup("10.1000/xyz123").await.unwrap();
        assert!(record.is_oa);
        assert_eq!(
            record.best_url(),
            Some("https://mirror.example.org/xyz123.pdf")
        );
    }

    #[tokio::test]
    async fn lookup_tolerates_missing_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"doi": "10.1/x"})))
            .mount(&server)
            .await;

        let record = client(&server).lookup("10.1/x").await.unwrap();
        assert!(!record.is_oa);
        assert!(record.best_url().is_none());
    }

    #[tokio::test]
    async fn lookup_maps_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client(&server).lookup("10.1/missing").await.unwrap_err();
        assert!(matches!(err, Error::OaIndex(_)));
    }

    #[test]
    fn best_url_requires_oa_flag() {
        let record = OaRecord {
            is_oa: false,
            best_oa_location: Some(OaLocation {
                url: Some("https://mirror.example.org/x.pdf".into()),
            }),
        };
        assert!(record.best_url().is_none());
    }

    #[test]
    fn best_url_rejects_empty_string() {
        let record = OaRecord {
            is_oa: true,
            best_oa_location: Some(OaLocation {
                url: Some(String::new()),
            }),
        };
        assert!(record.best_url().is_none());
    }
}

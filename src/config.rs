//! Configuration types for refbundle

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Whether the library belongs to a single user or a shared group
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryType {
    /// Personal library
    #[default]
    User,
    /// Shared group library
    Group,
}

impl LibraryType {
    /// URL path segment for this library type
    pub fn path_segment(&self) -> &'static str {
        match self {
            LibraryType::User => "users",
            LibraryType::Group => "groups",
        }
    }
}

/// Library service connection settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Base URL of the library API (default: "https://api.zotero.org")
    #[serde(default = "default_library_base_url")]
    pub base_url: String,

    /// Numeric library identifier
    #[serde(default)]
    pub library_id: String,

    /// User or group library
    #[serde(default)]
    pub library_type: LibraryType,

    /// Bearer credential for authenticated requests
    #[serde(default)]
    pub api_key: String,
}

impl LibraryConfig {
    /// URL prefix for this library, e.g. `users/12345`
    pub fn api_prefix(&self) -> String {
        format!("{}/{}", self.library_type.path_segment(), self.library_id)
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            base_url: default_library_base_url(),
            library_id: String::new(),
            library_type: LibraryType::default(),
            api_key: String::new(),
        }
    }
}

/// Download behavior settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout applied to every network attempt (default: 60s).
    ///
    /// A stuck network call must never block the whole run; expiry is treated
    /// as an ordinary per-source failure.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// Browser-like identification header used for direct and mirror
    /// downloads (some hosts refuse requests without one)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Base URL of the open-access index (default: "https://api.unpaywall.org")
    #[serde(default = "default_oa_base_url")]
    pub oa_base_url: String,

    /// Contact email the open-access index requires on lookups
    #[serde(default)]
    pub oa_email: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
            oa_base_url: default_oa_base_url(),
            oa_email: None,
        }
    }
}

/// Output bundling settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BundleConfig {
    /// Directory combined artifacts are written to (default: ".")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Rollover ceiling in bytes (default: 95 MiB, a buffer below the
    /// 100 MiB hard limit some consumers impose on a single file)
    #[serde(default = "default_size_ceiling")]
    pub size_ceiling_bytes: u64,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            size_ceiling_bytes: default_size_ceiling(),
        }
    }
}

/// Main configuration for [`CollectionBundler`](crate::pipeline::CollectionBundler)
///
/// Fields are organized into logical sub-configs:
/// - [`library`](LibraryConfig) — library service connection and credential
/// - [`fetch`](FetchConfig) — timeouts, identification headers, OA index
/// - [`bundle`](BundleConfig) — output directory and size ceiling
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Library service connection settings
    #[serde(default)]
    pub library: LibraryConfig,

    /// Download behavior settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Output bundling settings
    #[serde(default)]
    pub bundle: BundleConfig,
}

impl Config {
    /// Validate the configuration before a run
    pub fn validate(&self) -> Result<()> {
        if self.library.library_id.is_empty() {
            return Err(Error::Config {
                message: "library_id must not be empty".into(),
                key: Some("library.library_id".into()),
            });
        }
        if self.library.api_key.is_empty() {
            return Err(Error::Config {
                message: "api_key must not be empty".into(),
                key: Some("library.api_key".into()),
            });
        }
        normalized_url(&self.library.base_url, "library.base_url")?;
        normalized_url(&self.fetch.oa_base_url, "fetch.oa_base_url")?;
        if self.bundle.size_ceiling_bytes == 0 {
            return Err(Error::Config {
                message: "size_ceiling_bytes must be greater than zero".into(),
                key: Some("bundle.size_ceiling_bytes".into()),
            });
        }
        Ok(())
    }
}

/// Parse and normalize a base URL from config, trimming any trailing slash
pub(crate) fn normalized_url(raw: &str, key: &str) -> Result<String> {
    let parsed = Url::parse(raw).map_err(|e| Error::Config {
        message: format!("invalid URL '{raw}': {e}"),
        key: Some(key.to_string()),
    })?;
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

fn default_library_base_url() -> String {
    "https://api.zotero.org".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

fn default_oa_base_url() -> String {
    "https://api.unpaywall.org".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_size_ceiling() -> u64 {
    95 * 1024 * 1024
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            library: LibraryConfig {
                library_id: "12345".into(),
                api_key: "secret".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.library.base_url, "https://api.zotero.org");
        assert_eq!(config.library.library_type, LibraryType::User);
        assert_eq!(config.fetch.request_timeout, Duration::from_secs(60));
        assert_eq!(config.bundle.size_ceiling_bytes, 95 * 1024 * 1024);
    }

    #[test]
    fn validate_accepts_complete_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_library_id() {
        let mut config = valid_config();
        config.library.library_id.clear();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config { key: Some(k), .. } if k == "library.library_id"));
    }

    #[test]
    fn validate_rejects_missing_api_key() {
        let mut config = valid_config();
        config.library.api_key.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let mut config = valid_config();
        config.library.base_url = "not a url".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_ceiling() {
        let mut config = valid_config();
        config.bundle.size_ceiling_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn api_prefix_reflects_library_type() {
        let mut config = valid_config();
        assert_eq!(config.library.api_prefix(), "users/12345");
        config.library.library_type = LibraryType::Group;
        assert_eq!(config.library.api_prefix(), "groups/12345");
    }

    #[test]
    fn normalized_url_trims_trailing_slash() {
        let url = normalized_url("https://api.zotero.org/", "test").unwrap();
        assert_eq!(url, "https://api.zotero.org");
    }

    #[test]
    fn config_deserializes_with_partial_fields() {
        let json = r#"{"library": {"library_id": "99", "api_key": "k"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.library.library_id, "99");
        assert_eq!(config.library.base_url, "https://api.zotero.org");
        assert_eq!(config.bundle.size_ceiling_bytes, 95 * 1024 * 1024);
    }
}

//! Discovery configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DiscoveryError;

/// Maximum accepted AGENTS.md size (1 MiB).
pub const MAX_BODY_BYTES: u64 = 1_048_576;

/// Per-attempt fetch deadline.
pub const FETCH_TIMEOUT_SECS: u64 = 10;

/// Upper bound on how long a fetched policy is considered fresh (24 hours).
pub const MAX_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

/// How long past expiry a stale policy may be served when refresh fails (1 hour).
pub const STALE_GRACE_SECS: u64 = 60 * 60;

/// Discovery configuration, optionally loaded from a discovery.toml.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Refuse non-HTTPS origins and downgrading redirects. Only disable for
    /// local testing.
    #[serde(default = "default_enforce_https")]
    pub enforce_https: bool,

    /// Per-attempt deadline in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Largest accepted body, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,

    /// User-Agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Ceiling applied to the server's max-age.
    #[serde(default = "default_max_cache_ttl_secs")]
    pub max_cache_ttl_secs: u64,

    /// Stale-serving window after expiry when a refresh fails.
    #[serde(default = "default_stale_grace_secs")]
    pub stale_grace_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enforce_https: default_enforce_https(),
            timeout_secs: default_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
            user_agent: default_user_agent(),
            max_cache_ttl_secs: default_max_cache_ttl_secs(),
            stale_grace_secs: default_stale_grace_secs(),
        }
    }
}

// Serde default functions
fn default_enforce_https() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    FETCH_TIMEOUT_SECS
}

fn default_max_body_bytes() -> u64 {
    MAX_BODY_BYTES
}

fn default_user_agent() -> String {
    format!("agents-md-discovery/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_cache_ttl_secs() -> u64 {
    MAX_CACHE_TTL_SECS
}

fn default_stale_grace_secs() -> u64 {
    STALE_GRACE_SECS
}

impl DiscoveryConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, DiscoveryError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| DiscoveryError::ConfigRead {
                path: path.to_path_buf(),
                source,
            })?;
        toml::from_str(&content).map_err(|source| DiscoveryError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Try to load config, returning the default if the file is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                if path.exists() {
                    tracing::warn!(error = %e, "ignoring unusable discovery config");
                }
                Self::default()
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol_limits() {
        let config = DiscoveryConfig::default();
        assert!(config.enforce_https);
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.max_body_bytes, 1_048_576);
        assert_eq!(config.max_cache_ttl_secs, 86_400);
        assert_eq!(config.stale_grace_secs, 3_600);
        assert!(config.user_agent.starts_with("agents-md-discovery/"));
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("discovery.toml");
        std::fs::write(&path, "enforce_https = false\ntimeout_secs = 3\n").unwrap();

        let config = DiscoveryConfig::load(&path).unwrap();
        assert!(!config.enforce_https);
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.max_body_bytes, MAX_BODY_BYTES);
    }

    #[test]
    fn invalid_toml_is_reported_and_defaulted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("discovery.toml");
        std::fs::write(&path, "timeout_secs = \"soon\"\n").unwrap();

        assert!(matches!(
            DiscoveryConfig::load(&path),
            Err(DiscoveryError::ConfigParse { .. })
        ));
        assert_eq!(DiscoveryConfig::load_or_default(&path), DiscoveryConfig::default());
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            DiscoveryConfig::load(&path),
            Err(DiscoveryError::ConfigRead { .. })
        ));
        assert_eq!(DiscoveryConfig::load_or_default(&path), DiscoveryConfig::default());
    }
}

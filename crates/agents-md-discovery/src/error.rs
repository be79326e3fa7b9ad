// error.rs — Error types for discovery and transport.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed source error from the network layer.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures surfaced to the caller of a discovery.
///
/// "No policy published" is not an error; see `Discovery::policy`.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The origin is not HTTPS and HTTPS enforcement is on. Raised before any
    /// network call.
    #[error("policy files must be served over HTTPS; refusing origin '{origin}' (set enforce_https = false for local testing)")]
    InsecureOrigin { origin: String },

    /// The origin could not be parsed as an http(s) URL.
    #[error("invalid origin '{origin}': {reason}")]
    InvalidOrigin { origin: String, reason: String },

    /// DNS, connection or TLS failure: the site is unreachable.
    #[error("network failure fetching '{url}': {source}")]
    Network {
        url: String,
        #[source]
        source: BoxError,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to initialize HTTP client: {0}")]
    ClientInit(#[source] reqwest::Error),

    #[error("failed to read config '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config '{path}': {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Failures of a single transport request.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport's own deadline fired.
    #[error("request timed out")]
    TimedOut,

    /// Declared or measured body size exceeded the limit.
    #[error("response body of {bytes} bytes exceeds the {limit}-byte limit")]
    BodyTooLarge { bytes: u64, limit: u64 },

    /// Any other network-level failure.
    #[error("network failure: {0}")]
    Network(#[source] BoxError),
}

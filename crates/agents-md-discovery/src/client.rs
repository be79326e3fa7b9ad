// client.rs — Two-candidate AGENTS.md discovery.
//
//   Idle → FetchPrimary ─found─────→ Parse → Done
//               │
//               └─not found─→ FetchFallback ─found─→ Parse → Done
//                                  │
//                                  └─not found─→ NoPolicyFound
//
// Candidates are tried strictly in order, never in parallel. "Not found"
// covers 404 and every other non-success status, a redirect that settled on
// a non-HTTPS URL, an oversized body, and a timed-out attempt. Any other
// network failure aborts discovery and is returned to the caller, so an
// unreachable site is never mistaken for one without a policy.

use std::time::Duration;

use agents_md_policy::{parse, ParseOutcome};
use serde::Serialize;
use url::Url;

use crate::config::DiscoveryConfig;
use crate::error::{DiscoveryError, TransportError};
use crate::transport::{HttpTransport, Transport, TransportResponse};

/// Primary candidate, relative to the origin.
pub const PRIMARY_PATH: &str = "/AGENTS.md";

/// Fallback candidate, relative to the origin.
pub const FALLBACK_PATH: &str = "/.well-known/agents.md";

/// Content types the format is served with. Both are handled identically.
const EXPECTED_CONTENT_TYPES: &[&str] = &["text/markdown", "text/plain"];

/// Why a candidate did or did not produce a policy body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AttemptStatus {
    /// Success status and an acceptable body.
    Found,
    /// Any non-success status.
    NotFound { status: u16 },
    /// Redirects ended on a non-HTTPS URL while HTTPS was enforced.
    Downgraded { final_url: String },
    /// Declared or measured body size over the limit.
    TooLarge { bytes: u64 },
    /// The per-attempt deadline fired.
    TimedOut,
}

/// One candidate URL and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateAttempt {
    pub url: String,
    #[serde(flatten)]
    pub status: AttemptStatus,
}

/// A policy file that was found and parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPolicy {
    /// Candidate URL that produced the body.
    pub url: Url,
    /// Parse result; may itself be unsuccessful.
    pub outcome: ParseOutcome,
    /// `max-age` from the response's Cache-Control, if any.
    pub max_age: Option<Duration>,
}

/// The full record of one discovery run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    /// Normalized origin.
    pub origin: Url,
    /// Attempts in the order they were made.
    pub attempts: Vec<CandidateAttempt>,
    /// `None` means no policy is published; apply permissive defaults.
    pub policy: Option<DiscoveredPolicy>,
}

impl Discovery {
    pub fn found(&self) -> bool {
        self.policy.is_some()
    }

    /// Whether any candidate was abandoned because of a scheme downgrade.
    pub fn downgraded(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| matches!(a.status, AttemptStatus::Downgraded { .. }))
    }

    pub fn into_outcome(self) -> Option<ParseOutcome> {
        self.policy.map(|p| p.outcome)
    }
}

/// Candidate URLs for an origin, in the order they are tried.
pub fn candidate_urls(origin: &Url) -> Result<Vec<Url>, DiscoveryError> {
    let base = origin.as_str().trim_end_matches('/');
    [PRIMARY_PATH, FALLBACK_PATH]
        .iter()
        .map(|path| {
            Url::parse(&format!("{base}{path}")).map_err(|e| DiscoveryError::InvalidOrigin {
                origin: origin.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Outcome of fetching one candidate.
enum Candidate {
    Body(TransportResponse),
    Skipped(AttemptStatus),
}

/// Stateless discovery client. Safe to share; holds no per-origin state.
#[derive(Debug, Clone)]
pub struct DiscoveryClient<T = HttpTransport> {
    transport: T,
    config: DiscoveryConfig,
}

impl DiscoveryClient<HttpTransport> {
    /// A client backed by reqwest.
    pub fn new(config: DiscoveryConfig) -> Result<Self, DiscoveryError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self { transport, config })
    }
}

impl<T: Transport> DiscoveryClient<T> {
    pub fn with_transport(transport: T, config: DiscoveryConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Parse and check an origin. Refuses non-HTTPS origins when enforcement
    /// is on; no request is made in that case.
    pub fn normalize_origin(&self, origin: &str) -> Result<Url, DiscoveryError> {
        let mut url = Url::parse(origin.trim()).map_err(|e| DiscoveryError::InvalidOrigin {
            origin: origin.to_string(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "https" => {}
            "http" if !self.config.enforce_https => {}
            "http" => {
                return Err(DiscoveryError::InsecureOrigin {
                    origin: origin.to_string(),
                })
            }
            other => {
                return Err(DiscoveryError::InvalidOrigin {
                    origin: origin.to_string(),
                    reason: format!("unsupported scheme '{other}'"),
                })
            }
        }

        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }

    /// Locate, fetch and parse the policy for `origin`.
    pub async fn discover(&self, origin: &str) -> Result<Discovery, DiscoveryError> {
        let origin = self.normalize_origin(origin)?;
        let mut attempts = Vec::new();

        for url in candidate_urls(&origin)? {
            match self.fetch_candidate(&url).await? {
                Candidate::Body(response) => {
                    let policy = self.parse_body(url, response);
                    tracing::info!(
                        origin = %origin,
                        url = %policy.url,
                        success = policy.outcome.success,
                        warnings = policy.outcome.warnings.len(),
                        "discovered AGENTS.md policy"
                    );
                    attempts.push(CandidateAttempt {
                        url: policy.url.to_string(),
                        status: AttemptStatus::Found,
                    });
                    return Ok(Discovery {
                        origin,
                        attempts,
                        policy: Some(policy),
                    });
                }
                Candidate::Skipped(status) => {
                    tracing::debug!(url = %url, ?status, "candidate not usable");
                    attempts.push(CandidateAttempt {
                        url: url.to_string(),
                        status,
                    });
                }
            }
        }

        tracing::info!(origin = %origin, "no AGENTS.md policy published");
        Ok(Discovery {
            origin,
            attempts,
            policy: None,
        })
    }

    /// One bounded attempt. Only non-timeout network failures are errors.
    async fn fetch_candidate(&self, url: &Url) -> Result<Candidate, DiscoveryError> {
        let limit = self.config.max_body_bytes;
        let result =
            tokio::time::timeout(self.config.timeout(), self.transport.get(url, limit)).await;

        let response = match result {
            Err(_) | Ok(Err(TransportError::TimedOut)) => {
                tracing::warn!(url = %url, timeout_secs = self.config.timeout_secs, "fetch timed out");
                return Ok(Candidate::Skipped(AttemptStatus::TimedOut));
            }
            Ok(Err(TransportError::BodyTooLarge { bytes, limit })) => {
                tracing::warn!(url = %url, bytes, limit, "policy file exceeds size limit");
                return Ok(Candidate::Skipped(AttemptStatus::TooLarge { bytes }));
            }
            Ok(Err(TransportError::Network(source))) => {
                return Err(DiscoveryError::Network {
                    url: url.to_string(),
                    source,
                })
            }
            Ok(Ok(response)) => response,
        };

        if self.config.enforce_https && response.final_url.scheme() != "https" {
            tracing::warn!(
                url = %url,
                final_url = %response.final_url,
                "redirect downgraded to a non-HTTPS URL; ignoring response"
            );
            return Ok(Candidate::Skipped(AttemptStatus::Downgraded {
                final_url: response.final_url.to_string(),
            }));
        }

        if !(200..300).contains(&response.status) {
            return Ok(Candidate::Skipped(AttemptStatus::NotFound {
                status: response.status,
            }));
        }

        let measured = response.body.len() as u64;
        if measured > limit {
            tracing::warn!(url = %url, bytes = measured, limit, "policy file exceeds size limit");
            return Ok(Candidate::Skipped(AttemptStatus::TooLarge { bytes: measured }));
        }

        Ok(Candidate::Body(response))
    }

    fn parse_body(&self, url: Url, response: TransportResponse) -> DiscoveredPolicy {
        if let Some(content_type) = &response.content_type {
            let essence = content_type
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase();
            if !EXPECTED_CONTENT_TYPES.contains(&essence.as_str()) {
                tracing::debug!(url = %url, %content_type, "unexpected content type; parsing anyway");
            }
        }

        let text = String::from_utf8_lossy(&response.body);
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

        DiscoveredPolicy {
            url,
            outcome: parse(text),
            max_age: response.cache_control.as_deref().and_then(parse_max_age),
        }
    }
}

/// Extract `max-age` from a Cache-Control header value.
pub fn parse_max_age(cache_control: &str) -> Option<Duration> {
    cache_control.split(',').find_map(|directive| {
        let (name, value) = directive.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("max-age") {
            return None;
        }
        value
            .trim()
            .trim_matches('"')
            .parse::<u64>()
            .ok()
            .map(Duration::from_secs)
    })
}

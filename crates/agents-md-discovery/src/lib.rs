//! # agents-md-discovery
//!
//! Locates, fetches and caches the AGENTS.md policy published by a web
//! origin.
//!
//! [`DiscoveryClient::discover`] tries `{origin}/AGENTS.md`, then
//! `{origin}/.well-known/agents.md`, one at a time, and hands the first
//! successful body to [`agents_md_policy::parse`]. [`PolicyCache`] wraps a
//! client with a bounded time-to-live and a stale grace window.
//!
//! ## Key invariants
//!
//! - **HTTPS only**: a non-HTTPS origin is refused before any request, and a
//!   response that settled on a non-HTTPS URL after redirects is abandoned.
//! - **Bounded**: bodies over 1 MiB are rejected, each attempt has a
//!   10-second deadline. A timeout moves on to the next candidate.
//! - **Absence is not an error**: when neither candidate exists the result is
//!   "no policy", and callers apply permissive defaults. Unreachable sites are
//!   errors, so the two cases stay distinguishable.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use cache::{effective_ttl, CacheEntry, CacheLookup, PolicyCache};
pub use client::{
    candidate_urls, parse_max_age, AttemptStatus, CandidateAttempt, DiscoveredPolicy, Discovery,
    DiscoveryClient,
};
pub use config::DiscoveryConfig;
pub use error::{DiscoveryError, TransportError};
pub use transport::{HttpTransport, Transport, TransportResponse};

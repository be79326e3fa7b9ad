// cache.rs — Time-bounded policy cache over a stateless DiscoveryClient.
//
//   fresh   now < fetched_at + ttl             → served without a request
//   stale   refresh succeeded                   → entry replaced wholesale
//           refresh failed, now < expiry+grace  → stale entry served
//           refresh failed, past the window     → entry evicted
//
// Freshness is computed on read; nothing expires in the background. A
// refresh "fails" when discovery errors or when neither candidate produced a
// policy this time. Refreshes are single-flight per origin: concurrent
// readers of an expired origin wait on one fetch and then re-read the map.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use agents_md_policy::ParseOutcome;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::{Mutex, RwLock};
use url::Url;

use crate::client::{Discovery, DiscoveryClient};
use crate::error::DiscoveryError;
use crate::transport::{HttpTransport, Transport};

/// `min(max_age, ceiling)`; the ceiling alone when the server sent no max-age.
pub fn effective_ttl(max_age: Option<Duration>, ceiling: Duration) -> Duration {
    max_age.map_or(ceiling, |age| age.min(ceiling))
}

/// One cached policy. Replaced on refresh, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub outcome: ParseOutcome,
    pub source_url: Url,
    pub fetched_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn expires_at(&self) -> DateTime<Utc> {
        add(self.fetched_at, self.ttl)
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at()
    }

    /// Whether the entry may still be served after a failed refresh.
    pub fn within_grace(&self, now: DateTime<Utc>, grace: Duration) -> bool {
        now < add(self.expires_at(), grace)
    }
}

fn add(at: DateTime<Utc>, span: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(span)
        .ok()
        .and_then(|delta| at.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Result of a cache read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// Served from cache, within its TTL.
    Fresh(Arc<CacheEntry>),
    /// Fetched just now.
    Refreshed(Arc<CacheEntry>),
    /// Expired, refresh failed, still inside the grace window.
    Stale(Arc<CacheEntry>),
    /// No policy available; apply permissive defaults.
    NoPolicy,
}

impl CacheLookup {
    pub fn entry(&self) -> Option<&Arc<CacheEntry>> {
        match self {
            Self::Fresh(e) | Self::Refreshed(e) | Self::Stale(e) => Some(e),
            Self::NoPolicy => None,
        }
    }

    pub fn outcome(&self) -> Option<&ParseOutcome> {
        self.entry().map(|e| &e.outcome)
    }
}

/// Per-origin policy cache. Entries are keyed by normalized origin.
pub struct PolicyCache<T = HttpTransport> {
    client: DiscoveryClient<T>,
    entries: RwLock<HashMap<String, Arc<CacheEntry>>>,
    /// One lock per origin, held across that origin's refresh.
    refreshing: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<T: Transport> PolicyCache<T> {
    pub fn new(client: DiscoveryClient<T>) -> Self {
        Self {
            client,
            entries: RwLock::new(HashMap::new()),
            refreshing: Mutex::new(HashMap::new()),
        }
    }

    pub fn client(&self) -> &DiscoveryClient<T> {
        &self.client
    }

    pub async fn get(&self, origin: &str) -> Result<CacheLookup, DiscoveryError> {
        self.get_at(origin, Utc::now()).await
    }

    /// Cache read evaluated at `now`.
    ///
    /// Errors only when discovery fails and no entry is inside its grace
    /// window.
    pub async fn get_at(
        &self,
        origin: &str,
        now: DateTime<Utc>,
    ) -> Result<CacheLookup, DiscoveryError> {
        let key = self.client.normalize_origin(origin)?.to_string();
        if let Some(entry) = self.fresh_entry(&key, now).await {
            return Ok(CacheLookup::Fresh(entry));
        }

        let lock = self.refresh_lock(&key).await;
        let _guard = lock.lock().await;

        // Another reader may have refreshed while this one waited.
        let cached = self.entries.read().await.get(&key).cloned();
        if let Some(entry) = &cached {
            if entry.is_fresh(now) {
                return Ok(CacheLookup::Fresh(Arc::clone(entry)));
            }
        }

        let refreshed = self.client.discover(&key).await;
        let failure = match refreshed {
            Ok(Discovery {
                policy: Some(found),
                ..
            }) => {
                let config = self.client.config();
                let ceiling = Duration::from_secs(config.max_cache_ttl_secs);
                let entry = Arc::new(CacheEntry {
                    ttl: effective_ttl(found.max_age, ceiling),
                    outcome: found.outcome,
                    source_url: found.url,
                    fetched_at: now,
                });
                self.entries.write().await.insert(key, Arc::clone(&entry));
                return Ok(CacheLookup::Refreshed(entry));
            }
            other => other,
        };

        let grace = Duration::from_secs(self.client.config().stale_grace_secs);
        match cached {
            Some(entry) if entry.within_grace(now, grace) => {
                tracing::warn!(
                    origin = %key,
                    expired_at = %entry.expires_at(),
                    "policy refresh failed; serving stale entry"
                );
                Ok(CacheLookup::Stale(entry))
            }
            cached => {
                if cached.is_some() {
                    tracing::info!(origin = %key, "stale policy past grace window; evicting");
                    self.entries.write().await.remove(&key);
                }
                failure.map(|_| CacheLookup::NoPolicy)
            }
        }
    }

    async fn fresh_entry(&self, key: &str, now: DateTime<Utc>) -> Option<Arc<CacheEntry>> {
        self.entries
            .read()
            .await
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .cloned()
    }

    async fn refresh_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.refreshing.lock().await;
        Arc::clone(locks.entry(key.to_string()).or_default())
    }

    /// Drop the entry for `origin`, if any.
    pub async fn invalidate(&self, origin: &str) -> Result<bool, DiscoveryError> {
        let key = self.client.normalize_origin(origin)?.to_string();
        Ok(self.entries.write().await.remove(&key).is_some())
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

//! Response cache for warehouse queries.
//!
//! Dashboard clients tend to re-issue textually identical queries as users flip between
//! charts, so results are memoized keyed by the verbatim query text, including any
//! embedded date-range literals. Entries expire a fixed time after insertion; a cache
//! hit never touches the warehouse. There is no invalidation path beyond expiry and no
//! capacity bound, so callers must bound the variety of distinct query strings if
//! memory growth matters.

use crate::error::DataServiceError;
use crate::metrics;
use crate::models::Record;

use cached::{Cached, TimedCache};
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;

/// A TTL cache of query results, keyed by the literal query text.
///
/// Backed by [cached::stores::TimedCache] behind an async mutex. The lock is only held
/// while probing or storing, not across the compute; when concurrent requests miss on
/// the same key each runs the compute and the last write wins (at-least-once compute
/// semantics).
pub struct ResponseCache {
    store: Mutex<TimedCache<String, Vec<Record>>>,
}

impl ResponseCache {
    /// Create a response cache whose entries live for `ttl` from insertion.
    ///
    /// Hits do not refresh the TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: Mutex::new(TimedCache::with_lifespan(ttl.as_secs())),
        }
    }

    /// Return the memoized value for `key` if present and unexpired, otherwise run
    /// `compute`, store its result and return it.
    ///
    /// A failed compute is not cached.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &str,
        compute: F,
    ) -> Result<Vec<Record>, DataServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Record>, DataServiceError>>,
    {
        {
            let mut store = self.store.lock().await;
            if let Some(records) = store.cache_get(key) {
                tracing::debug!(key, "response cache hit");
                metrics::CACHE_HITS.inc();
                return Ok(records.clone());
            }
        }
        tracing::debug!(key, "response cache miss");
        metrics::CACHE_MISSES.inc();
        let records = compute().await?;
        let mut store = self.store.lock().await;
        store.cache_set(key.to_string(), records.clone());
        Ok(records)
    }
}

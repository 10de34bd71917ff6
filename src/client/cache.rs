//! Time-bounded response cache with one refresher per key.
//!
//! Each key owns a slot guarded by a [`tokio::sync::Mutex`]. A reader takes
//! the slot lock, returns the entry if it is fresh, and otherwise runs the
//! refresh while still holding the lock. Concurrent readers of the same key
//! wait for that single refresh instead of issuing their own, and nobody can
//! observe a half-written entry. A refresh that fails or is abandoned leaves
//! the previous entry in place.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::ClientError;

/// A cached value and the instant it was fetched.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Cached value.
    pub value: V,
    /// When the value was fetched from upstream.
    pub fetched_at: Instant,
}

impl<V> CacheEntry<V> {
    /// Time since the value was fetched.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    /// Returns `true` while `age < ttl`.
    #[must_use]
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }
}

/// Notice that an expired entry was served because its refresh failed.
///
/// Informational, not a failure: the caller still gets a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleCacheServed {
    /// Age of the value that was served.
    pub age: Duration,
    /// Why the refresh failed.
    pub cause: ClientError,
}

/// A value read through the cache.
#[derive(Debug, Clone)]
pub struct Served<V> {
    /// The value.
    pub value: V,
    /// Present when the value is stale; see [`StaleCacheServed`].
    pub stale: Option<StaleCacheServed>,
}

impl<V> Served<V> {
    /// Discards the staleness notice.
    pub fn into_value(self) -> V {
        self.value
    }
}

type Slot<V> = Arc<tokio::sync::Mutex<Option<CacheEntry<V>>>>;

/// Keyed cache whose entries expire after a fixed TTL.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    slots: Mutex<HashMap<K, Slot<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an empty cache.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, key: &K) -> Slot<V> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    /// Returns the fresh entry for `key`, or runs `refresh` and stores its
    /// result.
    ///
    /// When `refresh` fails and `serve_stale` is set, the expired entry (if
    /// any) is returned with a [`StaleCacheServed`] notice instead of the
    /// error.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `refresh` when there is nothing to
    /// serve in its place.
    pub async fn get_or_refresh<F, Fut>(
        &self,
        key: &K,
        serve_stale: bool,
        refresh: F,
    ) -> Result<Served<V>, ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ClientError>>,
    {
        let slot = self.slot(key);
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref()
            && cached.is_fresh(self.ttl)
        {
            return Ok(Served {
                value: cached.value.clone(),
                stale: None,
            });
        }

        match refresh().await {
            Ok(value) => {
                *entry = Some(CacheEntry {
                    value: value.clone(),
                    fetched_at: Instant::now(),
                });
                Ok(Served { value, stale: None })
            }
            Err(cause) => match entry.as_ref() {
                Some(expired) if serve_stale => {
                    let age = expired.age();
                    tracing::warn!(
                        age_ms = u64::try_from(age.as_millis()).unwrap_or(u64::MAX),
                        error = %cause,
                        "refresh failed, serving stale cache entry"
                    );
                    Ok(Served {
                        value: expired.value.clone(),
                        stale: Some(StaleCacheServed { age, cause }),
                    })
                }
                _ => Err(cause),
            },
        }
    }

    /// Age of the entry for `key`, or `None` if it is absent or currently
    /// being refreshed.
    #[must_use]
    pub fn age(&self, key: &K) -> Option<Duration> {
        let slot = self.slot(key);
        let entry = slot.try_lock().ok()?;
        entry.as_ref().map(CacheEntry::age)
    }

    /// Drops the entry for `key` so the next read refetches.
    pub async fn invalidate(&self, key: &K) {
        let slot = self.slot(key);
        *slot.lock().await = None;
    }
}

//! In-process TTL cache for paginated listings
//!
//! Memoizes expensive paginated/filterable queries keyed by the query's
//! identifying parameters. Entries expire lazily: expiry is checked on
//! read, and an expired entry is removed by the `get` that observes it.
//! There is no background sweep and no entry cap, so a pathological
//! stream of unique keys grows the cache until the next invalidation or
//! process restart.
//!
//! Invalidation operates over a key prefix rather than individual keys,
//! because any write can shift the total count and ordering of every
//! cached page of a listing.
//!
//! # Thread Safety
//!
//! Uses `tokio::sync::RwLock` for async-safe access; each instance is
//! cheaply cloneable and shares its entries.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// A cached value with its absolute expiry time
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// TTL cache for listing pages, with prefix invalidation
///
/// Constructed per listing namespace (one instance for patient pages,
/// one for note pages) so that a prefix clear targets exactly that
/// listing's cached pages.
#[derive(Clone)]
pub struct ListingCache<T> {
    entries: Arc<RwLock<HashMap<String, CacheEntry<T>>>>,
    ttl: Duration,
}

impl<T: Clone> ListingCache<T> {
    /// Create a cache whose entries live for `ttl` after insertion
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Look up a key, returning the value only if present and unexpired
    ///
    /// An expired entry found during lookup is removed. Absence is a
    /// normal result, not a failure.
    pub async fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Store a value with expiry `now + ttl`, overwriting any existing entry
    pub async fn set(&self, key: impl Into<String>, value: T) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        let mut entries = self.entries.write().await;
        entries.insert(key.into(), entry);
    }

    /// Remove every key starting with `prefix`, or everything if `None`
    ///
    /// This is the invalidation primitive called after every
    /// create/update/delete on the listing's underlying store.
    pub async fn clear_by_prefix(&self, prefix: Option<&str>) {
        let mut entries = self.entries.write().await;
        match prefix {
            Some(prefix) => entries.retain(|key, _| !key.starts_with(prefix)),
            None => entries.clear(),
        }
    }

    /// Remove every key for which the predicate returns true
    pub async fn clear_by_filter<F>(&self, predicate: F)
    where
        F: Fn(&str) -> bool,
    {
        let mut entries = self.entries.write().await;
        entries.retain(|key, _| !predicate(key));
    }

    /// Current key strings, expired or not
    ///
    /// Does not trigger expiry checks; only `get` enforces expiry.
    pub async fn keys(&self) -> Vec<String> {
        let entries = self.entries.read().await;
        entries.keys().cloned().collect()
    }

    /// Number of stored entries, expired or not
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.len()
    }

    /// Check whether the cache holds no entries
    pub async fn is_empty(&self) -> bool {
        let entries = self.entries.read().await;
        entries.is_empty()
    }
}

//! Shared Response Cache
//!
//! Cloneable, thread-safe handle over a [`CacheStore`]. A single mutex covers
//! every logical operation, including reaper sweeps.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::info;

use crate::cache::{CacheStats, CacheStore, CachedResponse};
use crate::config::Config;

/// Thread-safe response cache shared by all request handlers.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    store: Arc<Mutex<CacheStore>>,
}

impl ResponseCache {
    /// Creates an empty cache holding at most `max_entries` responses for `ttl` each.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        info!(
            "Cache initialized with max_size={} and ttl={}s",
            max_entries,
            ttl.as_secs()
        );
        Self {
            store: Arc::new(Mutex::new(CacheStore::new(max_entries, ttl))),
        }
    }

    /// Creates a cache sized from the configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cache_max_entries, config.cache_ttl())
    }

    /// Returns the cached response for `key` if present and fresh.
    pub async fn get(&self, key: &str) -> Option<CachedResponse> {
        self.store.lock().await.get(key)
    }

    /// Inserts or refreshes the response for `key`.
    pub async fn put(&self, key: impl Into<String>, response: CachedResponse) {
        self.store.lock().await.put(key.into(), response)
    }

    /// Drops every expired entry, returning how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        self.store.lock().await.cleanup_expired()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.lock().await.stats()
    }

    pub async fn len(&self) -> usize {
        self.store.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.lock().await.is_empty()
    }

    pub async fn contains_key(&self, key: &str) -> bool {
        self.store.lock().await.contains_key(key)
    }
}

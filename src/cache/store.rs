//! Cache Store Module
//!
//! Single-threaded cache engine: HashMap storage indexed into an LRU list,
//! with a fixed TTL for every entry. Thread safety lives in [`super::ResponseCache`].

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, CachedResponse, LruList, NodeId};

#[derive(Debug)]
struct Slot {
    entry: CacheEntry,
    node: NodeId,
}

// == Cache Store ==
/// Bounded response storage with LRU eviction and TTL expiry.
///
/// Every key in `entries` owns exactly one node in `lru`.
#[derive(Debug)]
pub struct CacheStore {
    /// Key to entry + recency handle
    entries: HashMap<String, Slot>,
    /// Recency order, head = most recently used
    lru: LruList,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries kept after a put
    max_entries: usize,
    /// TTL applied to every entry
    ttl: Duration,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore with the given capacity and TTL.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruList::new(),
            stats: CacheStats::new(),
            max_entries,
            ttl,
        }
    }

    // == Get ==
    /// Retrieves a response by key.
    pub fn get(&mut self, key: &str) -> Option<CachedResponse> {
        self.get_at(key, Instant::now())
    }

    /// Retrieves a response by key as of `now`.
    ///
    /// A hit promotes the key to most recently used. An expired entry is
    /// removed and reported as absent.
    pub fn get_at(&mut self, key: &str, now: Instant) -> Option<CachedResponse> {
        let Some(slot) = self.entries.get(key) else {
            debug!("Cache MISS: {}", key);
            self.stats.record_miss();
            return None;
        };

        if slot.entry.is_expired_at(now) {
            debug!("Cache EXPIRED: {}", key);
            self.remove(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            return None;
        }

        let node = slot.node;
        let response = slot.entry.response.clone();
        self.lru.move_to_front(node);
        self.stats.record_hit();
        debug!("Cache HIT: {}", key);
        Some(response)
    }

    // == Put ==
    /// Stores a response under `key`.
    pub fn put(&mut self, key: String, response: CachedResponse) {
        self.put_at(key, response, Instant::now())
    }

    /// Stores a response under `key` as of `now`.
    ///
    /// Overwriting an existing key refreshes it and never evicts. A new key
    /// is inserted first and then, if the store is over capacity, exactly one
    /// least recently used entry is evicted.
    pub fn put_at(&mut self, key: String, response: CachedResponse, now: Instant) {
        if let Some(slot) = self.entries.get_mut(&key) {
            slot.entry.refresh(response, self.ttl, now);
            let node = slot.node;
            self.lru.move_to_front(node);
            debug!("Cache UPDATED: {}", key);
            return;
        }

        let node = self.lru.push_front(key.clone());
        let entry = CacheEntry::new(response, self.ttl, now);
        debug!("Cache INSERTED: {}", key);
        self.entries.insert(key, Slot { entry, node });

        if self.entries.len() > self.max_entries {
            if let Some(evicted) = self.lru.pop_back() {
                self.entries.remove(&evicted);
                self.stats.record_eviction();
                debug!("Cache EVICTED (LRU): {}", evicted);
            }
        }

        self.stats.set_total_entries(self.entries.len());
        debug_assert_eq!(self.entries.len(), self.lru.len());
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and returns how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        self.cleanup_expired_at(Instant::now())
    }

    /// Removes all entries expired as of `now`.
    pub fn cleanup_expired_at(&mut self, now: Instant) -> usize {
        let lru = &mut self.lru;
        let before = self.entries.len();

        self.entries.retain(|key, slot| {
            if slot.entry.is_expired_at(now) {
                debug!("Cache CLEANUP removed expired key: {}", key);
                lru.remove(slot.node);
                false
            } else {
                true
            }
        });

        let removed = before - self.entries.len();
        self.stats.record_expirations(removed);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Keys from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<String> {
        self.lru.iter().map(str::to_string).collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn remove(&mut self, key: &str) {
        if let Some(slot) = self.entries.remove(key) {
            self.lru.remove(slot.node);
        }
        self.stats.set_total_entries(self.entries.len());
    }
}

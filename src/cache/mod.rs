//! Cache Module
//!
//! Provides an in-memory response cache with TTL expiration and LRU eviction.

mod entry;
mod lru;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::{CacheEntry, CachedResponse};
pub use lru::{LruList, NodeId};
pub use shared::ResponseCache;
pub use stats::CacheStats;
pub use store::CacheStore;

/// Builds the cache key for an inbound request: `METHOD:target`.
///
/// `target` is the inbound path (with its query, if any), never the resolved
/// backend URL. The query is part of the key on purpose: `/items?page=1` and
/// `/items?page=2` are forwarded with their queries and cached apart, where a
/// path-only key would serve one page for both.
pub fn cache_key(method: &str, target: &str) -> String {
    format!("{}:{}", method, target)
}

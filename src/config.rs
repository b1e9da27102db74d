//! Configuration Module
//!
//! Handles loading and managing gateway configuration from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// == Defaults ==
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8081";
const DEFAULT_ROUTES_FILE: &str = "config/routes.json";
const DEFAULT_CACHE_MAX_ENTRIES: usize = 10;
const DEFAULT_CACHE_TTL: u64 = 60;
const DEFAULT_CLEANUP_INTERVAL: u64 = 10;
const DEFAULT_BACKEND_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Gateway configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Socket the gateway listens on
    pub listen_addr: SocketAddr,
    /// Path of the JSON route table
    pub routes_file: PathBuf,
    /// Maximum number of cached responses
    pub cache_max_entries: usize,
    /// TTL in seconds applied to every cached response
    pub cache_ttl: u64,
    /// Background reaper interval in seconds
    pub cleanup_interval: u64,
    /// Backend request timeout in milliseconds, 0 = wait indefinitely
    pub backend_timeout_ms: u64,
    /// Largest inbound body copied onto a backend request
    pub max_body_bytes: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `LISTEN_ADDR` - Listen socket (default: 0.0.0.0:8081)
    /// - `ROUTES_FILE` - Route table path (default: config/routes.json)
    /// - `CACHE_MAX_ENTRIES` - Cache capacity (default: 10)
    /// - `CACHE_TTL` - Cache TTL in seconds (default: 60)
    /// - `CLEANUP_INTERVAL` - Reaper frequency in seconds (default: 10)
    /// - `BACKEND_TIMEOUT_MS` - Backend timeout, 0 disables (default: 30000)
    /// - `MAX_BODY_BYTES` - Body copy limit (default: 10 MiB)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable lookup.
    ///
    /// Unset or unparseable values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            listen_addr: parse_or(&lookup, "LISTEN_ADDR", defaults.listen_addr),
            routes_file: lookup("ROUTES_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.routes_file),
            cache_max_entries: parse_or(&lookup, "CACHE_MAX_ENTRIES", defaults.cache_max_entries),
            cache_ttl: parse_or(&lookup, "CACHE_TTL", defaults.cache_ttl),
            cleanup_interval: parse_or(&lookup, "CLEANUP_INTERVAL", defaults.cleanup_interval),
            backend_timeout_ms: parse_or(&lookup, "BACKEND_TIMEOUT_MS", defaults.backend_timeout_ms),
            max_body_bytes: parse_or(&lookup, "MAX_BODY_BYTES", defaults.max_body_bytes),
        }
    }

    /// Cache TTL as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    /// Reaper interval as a Duration; never zero.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval.max(1))
    }

    /// Backend timeout, or None when disabled.
    pub fn backend_timeout(&self) -> Option<Duration> {
        (self.backend_timeout_ms > 0).then(|| Duration::from_millis(self.backend_timeout_ms))
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8081))),
            routes_file: PathBuf::from(DEFAULT_ROUTES_FILE),
            cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            cache_ttl: DEFAULT_CACHE_TTL,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            backend_timeout_ms: DEFAULT_BACKEND_TIMEOUT_MS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

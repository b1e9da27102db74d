//! Gateway Module
//!
//! Wires the route table, the response cache and the backend client into an
//! axum application. Every path and method is served by one fallback handler.

mod backend;
mod handler;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    Router,
};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::info;

use crate::cache::{CacheStats, ResponseCache};
use crate::config::Config;
use crate::error::Result;
use crate::router::RouteTable;
use crate::tasks::{spawn_reaper, Reaper};

pub use backend::{split_target, BackendClient, BackendRequest};
pub use handler::{gateway_handler, resolve_target};

/// State shared by all request handlers.
#[derive(Debug, Clone)]
pub struct GatewayState {
    /// Read-only route table
    pub routes: Arc<RouteTable>,
    pub cache: ResponseCache,
    pub backend: BackendClient,
    /// Largest inbound body copied onto a backend request
    pub max_body_bytes: usize,
}

impl GatewayState {
    pub fn new(
        routes: RouteTable,
        cache: ResponseCache,
        backend: BackendClient,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            routes: Arc::new(routes),
            cache,
            backend,
            max_body_bytes,
        }
    }
}

/// Creates the axum application for the given state.
///
/// # Middleware
/// - `Access-Control-Allow-Origin: *` on every reply
/// - Tracing: logs all requests
pub fn create_router(state: GatewayState) -> Router {
    Router::new()
        .fallback(gateway_handler)
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// == Gateway ==
/// A running gateway: shared state plus the cache reaper it owns.
///
/// Must be created inside a Tokio runtime.
#[derive(Debug)]
pub struct Gateway {
    state: GatewayState,
    reaper: Reaper,
}

impl Gateway {
    /// Builds the cache, backend client and reaper from `config`.
    pub fn new(config: &Config, routes: RouteTable) -> Result<Self> {
        let cache = ResponseCache::from_config(config);
        let backend = BackendClient::new(config.backend_timeout())?;
        match config.backend_timeout() {
            Some(timeout) => info!("Backend timeout set to {}ms", timeout.as_millis()),
            None => info!("Backend timeout disabled"),
        }

        let reaper = spawn_reaper(cache.clone(), config.cleanup_interval());
        let state = GatewayState::new(routes, cache, backend, config.max_body_bytes);

        info!("Gateway initialized with {} routes", state.routes.len());
        Ok(Self { state, reaper })
    }

    pub fn state(&self) -> &GatewayState {
        &self.state
    }

    /// The axum application serving this gateway.
    pub fn app(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Stops the reaper, waits for it, and returns the final cache statistics.
    pub async fn shutdown(self) -> CacheStats {
        self.reaper.shutdown().await;
        let stats = self.state.cache.stats().await;
        info!(
            "Gateway stopped: hits={}, misses={}, hit_rate={:.2}, evictions={}, expirations={}, entries={}",
            stats.hits,
            stats.misses,
            stats.hit_rate(),
            stats.evictions,
            stats.expirations,
            stats.total_entries
        );
        stats
    }
}

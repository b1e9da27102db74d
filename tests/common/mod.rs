//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use api_gateway::{Config, Gateway, RouteTable};
use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Gzip header bytes the mock sends for `/gzip` paths.
#[allow(dead_code)]
pub const GZIP_BODY: &[u8] = &[0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00];

/// Mock backend that echoes what it received and counts calls.
///
/// - `/fail/...` replies 500
/// - `/slow/...` waits 2 seconds before replying
/// - `/text/...` replies with a plain-text body
/// - `/gzip/...` replies with gzip-framed bytes and `Content-Encoding: gzip`
///   when the request accepts gzip
/// - anything else replies 200 with a JSON echo
pub struct MockBackend {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .fallback(echo_handler)
            .with_state(hits.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, hits }
    }

    /// Number of requests the backend has received.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

async fn echo_handler(State(hits): State<Arc<AtomicUsize>>, request: Request) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);

    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();
    let body: Bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();

    if path.starts_with("/slow") {
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
    if path.starts_with("/text") {
        return (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain")],
            Body::from("plain body"),
        )
            .into_response();
    }

    let accepts_gzip = parts
        .headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("gzip"));
    if path.starts_with("/gzip") && accepts_gzip {
        return (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/json"),
                (header::CONTENT_ENCODING, "gzip"),
            ],
            Body::from(GZIP_BODY),
        )
            .into_response();
    }

    let echo = json!({
        "method": parts.method.as_str(),
        "path": path,
        "query": parts.uri.query(),
        "body": String::from_utf8_lossy(&body),
        "x_test_header": parts
            .headers
            .get("x-test-header")
            .and_then(|v| v.to_str().ok()),
    });

    let status = if path.starts_with("/fail") {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    (status, Json(echo)).into_response()
}

/// Config used by the gateway helpers: default limits, short backend timeout.
pub fn test_config(cache_max_entries: usize, cache_ttl: u64) -> Config {
    Config {
        cache_max_entries,
        cache_ttl,
        backend_timeout_ms: 500,
        ..Config::default()
    }
}

/// Builds a gateway over `routes` with a short backend timeout.
pub fn gateway_with(routes: Value, cache_max_entries: usize, cache_ttl: u64) -> Gateway {
    gateway_with_config(routes, &test_config(cache_max_entries, cache_ttl))
}

pub fn gateway_with_config(routes: Value, config: &Config) -> Gateway {
    let routes = RouteTable::from_json(&routes.to_string()).unwrap();
    Gateway::new(config, routes).unwrap()
}

pub async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// A local address with nothing listening on it.
#[allow(dead_code)]
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

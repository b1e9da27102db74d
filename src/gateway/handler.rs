//! Gateway Handler
//!
//! The per-request pipeline: preflight, route match, static reply, cache
//! lookup, backend forward, cache store, reply.

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, info, warn};

use super::backend::BackendRequest;
use super::GatewayState;
use crate::cache::cache_key;
use crate::error::{GatewayError, Result};
use crate::router::{PathParams, RouteTarget};

const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, Accept";

/// Entry point for every inbound request.
///
/// All errors are turned into replies here; nothing propagates to the server.
pub async fn gateway_handler(State(state): State<GatewayState>, request: Request) -> Response {
    if request.method() == Method::OPTIONS {
        debug!("Handled CORS preflight for {}", request.uri());
        return preflight_response();
    }

    match handle_request(&state, request).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn handle_request(state: &GatewayState, request: Request) -> Result<Response> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    info!("Incoming request: {} {}", method, path);

    if !is_supported(&method) {
        return Err(GatewayError::MethodNotAllowed(method.to_string()));
    }

    // == Route match ==
    let Some(matched) = state.routes.match_route(&path, method.as_str()) else {
        warn!("No route matched for {} {}", method, path);
        return Err(GatewayError::RouteNotFound {
            method: method.to_string(),
            path,
        });
    };

    let template = match &matched.entry.target {
        RouteTarget::Static(body) => {
            info!("Served static response for {} {}", method, path);
            return Ok((StatusCode::OK, Json(body.clone())).into_response());
        }
        RouteTarget::Backend(template) => template,
    };
    let target = resolve_target(template, &matched.params);

    // == Cache lookup ==
    let key = cache_key(method.as_str(), &inbound_target(&request));
    if let Some(cached) = state.cache.get(&key).await {
        debug!("Serving {} from cache", key);
        return Ok(cached.into_response());
    }

    // == Backend forward ==
    let (parts, body) = request.into_parts();
    let body = if method == Method::POST || method == Method::PUT {
        read_body(body, state.max_body_bytes, &method, &path).await
    } else {
        None
    };

    let reply = state
        .backend
        .forward(BackendRequest {
            method: method.clone(),
            target: &target,
            query: parts.uri.query(),
            headers: &parts.headers,
            body,
        })
        .await?;

    if method == Method::GET && reply.status == StatusCode::OK {
        state.cache.put(key.clone(), reply.clone()).await;
        debug!("Stored response in cache for key: {}", key);
    }

    Ok(reply.into_response())
}

/// Substitutes every `{name}` in `template` with its captured value.
///
/// Plain substring replacement, applied in capture order.
pub fn resolve_target(template: &str, params: &PathParams) -> String {
    params
        .iter()
        .fold(template.to_string(), |target, (name, value)| {
            target.replace(&format!("{{{}}}", name), value)
        })
}

fn is_supported(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::POST | Method::PUT | Method::DELETE | Method::OPTIONS
    )
}

/// Path plus query, as received.
fn inbound_target(request: &Request) -> String {
    request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}

/// Reads the inbound body for forwarding. Failures are logged and the
/// request continues without a body.
async fn read_body(body: Body, limit: usize, method: &Method, path: &str) -> Option<Bytes> {
    match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => {
            debug!("Copied request body for {} {}", method, path);
            Some(bytes)
        }
        Err(e) => {
            warn!("Failed to extract request body for {} {}: {}", method, path, e);
            None
        }
    }
}

fn preflight_response() -> Response {
    (
        StatusCode::OK,
        [
            (
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOWED_METHODS),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOWED_HEADERS),
            ),
        ],
    )
        .into_response()
}

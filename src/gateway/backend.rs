//! Backend Client
//!
//! Forwards a resolved request to its backend service and captures the reply.

use std::time::Duration;

use axum::{
    body::Bytes,
    http::{header, HeaderMap, Method},
};
use tracing::{error, info};

use crate::cache::CachedResponse;
use crate::error::{GatewayError, Result};

/// Inbound headers that describe the inbound connection rather than the
/// message; the client sets its own.
const CONNECTION_HEADERS: [header::HeaderName; 3] = [
    header::HOST,
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
];

/// Splits an absolute target URL into its origin and its path.
///
/// `http://host:5001/users/1` → (`http://host:5001`, `/users/1`). A target
/// without a path maps to `/`.
pub fn split_target(target: &str) -> Result<(&str, &str)> {
    let scheme_end = target
        .find("://")
        .ok_or_else(|| GatewayError::InvalidTarget(target.to_string()))?;
    let authority_start = scheme_end + 3;
    if authority_start == target.len() {
        return Err(GatewayError::InvalidTarget(target.to_string()));
    }

    match target[authority_start..].find('/') {
        Some(offset) => {
            let split = authority_start + offset;
            Ok((&target[..split], &target[split..]))
        }
        None => Ok((target, "/")),
    }
}

/// Outbound request to one backend.
#[derive(Debug)]
pub struct BackendRequest<'a> {
    pub method: Method,
    /// Resolved backend URL (placeholders already substituted)
    pub target: &'a str,
    /// Inbound query string, without the `?`
    pub query: Option<&'a str>,
    pub headers: &'a HeaderMap,
    pub body: Option<Bytes>,
}

// == Backend Client ==
/// Pooled HTTP client shared by all requests.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
}

impl BackendClient {
    /// Creates a client; `timeout` bounds the whole backend exchange.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Sends one request to the backend. No retries.
    pub async fn forward(&self, request: BackendRequest<'_>) -> Result<CachedResponse> {
        let (origin, path) = split_target(request.target)?;
        let url = match request.query {
            Some(query) if !query.is_empty() => format!("{}{}?{}", origin, path, query),
            _ => format!("{}{}", origin, path),
        };

        let mut headers = request.headers.clone();
        for name in &CONNECTION_HEADERS {
            headers.remove(name);
        }

        let mut outbound = self
            .client
            .request(request.method.clone(), &url)
            .headers(headers);
        if let Some(body) = request.body {
            outbound = outbound.body(body);
        }

        let response = outbound.send().await.map_err(|e| backend_error(&url, e))?;
        let status = response.status();
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
        let content_encoding = response.headers().get(header::CONTENT_ENCODING).cloned();
        let body = response.bytes().await.map_err(|e| backend_error(&url, e))?;

        info!(
            "Forwarded request to backend: {} {} (Status: {})",
            request.method,
            url,
            status.as_u16()
        );

        Ok(CachedResponse {
            status,
            content_type,
            content_encoding,
            body,
        })
    }
}

fn backend_error(url: &str, e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        error!("Backend request to {} timed out: {}", url, e);
        GatewayError::BackendTimeout
    } else {
        error!("Backend request to {} failed: {}", url, e);
        GatewayError::BackendUnavailable(e.to_string())
    }
}

//! Error types for the gateway
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::warn;

// == Gateway Error Enum ==
/// Unified error type for the gateway.
///
/// Configuration variants are startup-fatal; the rest are per-request and are
/// turned into a reply at the pipeline boundary.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Route file could not be read
    #[error("Failed to read route configuration {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Route file is not a valid route table
    #[error("Invalid route configuration: {0}")]
    ConfigParse(String),

    /// Route pattern with an unterminated `{`
    #[error("Invalid route pattern: {0}")]
    InvalidPattern(String),

    /// No route matched the method and path
    #[error("Route not found")]
    RouteNotFound { method: String, path: String },

    /// Inbound method the gateway does not serve
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Resolved target is not an absolute URL
    #[error("Invalid backend target: {0}")]
    InvalidTarget(String),

    /// Backend unreachable or failed mid-exchange
    #[error("Backend request failed")]
    BackendUnavailable(String),

    /// Backend did not answer in time
    #[error("Backend request timed out")]
    BackendTimeout,

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Status code used when the error is replied to a client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::InvalidTarget(_) | GatewayError::BackendUnavailable(_) => {
                StatusCode::BAD_GATEWAY
            }
            GatewayError::BackendTimeout => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::ConfigRead { .. }
            | GatewayError::ConfigParse(_)
            | GatewayError::InvalidPattern(_)
            | GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            GatewayError::RouteNotFound { method, path } => {
                warn!("Sent error response: {} - {} ({} {})", status.as_u16(), self, method, path)
            }
            GatewayError::BackendUnavailable(detail) => {
                warn!("Sent error response: {} - {} ({})", status.as_u16(), self, detail)
            }
            _ => warn!("Sent error response: {} - {}", status.as_u16(), self),
        }

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the gateway.
pub type Result<T> = std::result::Result<T, GatewayError>;

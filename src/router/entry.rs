//! Route Entry Module
//!
//! One routing rule per (pattern, method) pair, as read from the route file.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{GatewayError, Result};

/// Target value that selects a canned reply instead of a backend.
pub const STATIC_RESPONSE_TARGET: &str = "static_response";

// == Route Target ==
/// Where a matched request goes.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteTarget {
    /// Reply with this JSON body, status 200
    Static(Value),
    /// Forward to this URL template (may contain `{param}` placeholders)
    Backend(String),
}

// == Route Entry ==
/// A routing rule. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteEntry {
    pub target: RouteTarget,
    /// Informational only
    pub description: String,
}

impl RouteEntry {
    pub fn backend(target: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            target: RouteTarget::Backend(target.into()),
            description: description.into(),
        }
    }

    pub fn static_response(body: Value, description: impl Into<String>) -> Self {
        Self {
            target: RouteTarget::Static(body),
            description: description.into(),
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self.target, RouteTarget::Static(_))
    }
}

/// Raw shape of one method entry in the route file.
#[derive(Debug, Deserialize)]
pub(crate) struct RawRouteEntry {
    target: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    response: Option<Value>,
}

impl RawRouteEntry {
    /// Validates the raw entry for `method pattern`.
    pub(crate) fn into_entry(self, pattern: &str, method: &str) -> Result<RouteEntry> {
        if self.target == STATIC_RESPONSE_TARGET {
            let body = self.response.ok_or_else(|| {
                GatewayError::ConfigParse(format!(
                    "{} {}: static_response target requires a \"response\" value",
                    method, pattern
                ))
            })?;
            return Ok(RouteEntry::static_response(body, self.description));
        }

        if self.target.is_empty() {
            return Err(GatewayError::ConfigParse(format!(
                "{} {}: empty target",
                method, pattern
            )));
        }
        Ok(RouteEntry::backend(self.target, self.description))
    }
}

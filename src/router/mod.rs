//! Router Module
//!
//! Ordered route table loaded once from a JSON file and matched linearly.
//!
//! # File format
//! ```json
//! {
//!   "/health":     { "GET": { "target": "static_response", "response": {"status": "ok"} } },
//!   "/users/{id}": { "GET": { "target": "http://localhost:5001/users/{id}", "description": "..." } }
//! }
//! ```
//!
//! Declaration order is match precedence.

mod entry;
mod pattern;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{GatewayError, Result};

pub use entry::{RouteEntry, RouteTarget, STATIC_RESPONSE_TARGET};
pub use pattern::{PathParams, RoutePattern};

use entry::RawRouteEntry;

// == Route ==
/// One pattern and its per-method entries.
#[derive(Debug, Clone)]
pub struct Route {
    source: String,
    /// None when the pattern failed to compile; such a route never matches
    pattern: Option<RoutePattern>,
    methods: HashMap<String, RouteEntry>,
}

impl Route {
    /// Builds a route, keeping it as a never-matching entry if the pattern is invalid.
    pub fn new(source: impl Into<String>, methods: HashMap<String, RouteEntry>) -> Self {
        let source = source.into();
        let pattern = match RoutePattern::compile(&source) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!("Route {} will never match: {}", source, e);
                None
            }
        };
        Self {
            source,
            pattern,
            methods,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.source
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}

// == Route Match ==
/// Result of a successful lookup.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    /// Pattern that matched
    pub pattern: &'a str,
    pub entry: &'a RouteEntry,
    pub params: PathParams,
}

// == Route Table ==
/// Ordered route table. Read-only once built, so it can be shared freely.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Creates an empty table that matches nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from routes in precedence order.
    pub fn from_routes(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Parses a route table from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(text)
            .map_err(|e| GatewayError::ConfigParse(e.to_string()))?;
        let Value::Object(patterns) = root else {
            return Err(GatewayError::ConfigParse(
                "route table must be a JSON object".to_string(),
            ));
        };

        let mut routes = Vec::with_capacity(patterns.len());
        for (pattern, methods) in patterns {
            let methods = parse_methods(&pattern, methods)?;
            routes.push(Route::new(pattern, methods));
        }
        Ok(Self { routes })
    }

    /// Reads and parses a route table file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| GatewayError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_json(&text)?;
        info!("Loaded {} routes from {}", table.len(), path.display());
        for route in table.routes() {
            let mut methods: Vec<&str> = route.methods().collect();
            methods.sort_unstable();
            debug!("Route {} [{}]", route.pattern(), methods.join(", "));
        }
        Ok(table)
    }

    /// Replaces this table with the content of `path`.
    ///
    /// On failure the current routes are left untouched.
    pub fn load_routes(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        match Self::from_file(path) {
            Ok(table) => {
                *self = table;
                Ok(self.len())
            }
            Err(e) => {
                warn!("Failed to load routes from {}: {}", path.display(), e);
                Err(e)
            }
        }
    }

    /// Finds the first route, in declaration order, that matches `path` and
    /// has an entry for `method`.
    ///
    /// A route whose pattern matches but lacks `method` does not stop the
    /// scan; a later route may still match.
    pub fn match_route(&self, path: &str, method: &str) -> Option<RouteMatch<'_>> {
        self.routes.iter().find_map(|route| {
            let params = route.pattern.as_ref()?.captures(path)?;
            let entry = route.methods.get(method)?;
            Some(RouteMatch {
                pattern: &route.source,
                entry,
                params,
            })
        })
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn parse_methods(pattern: &str, methods: Value) -> Result<HashMap<String, RouteEntry>> {
    let Value::Object(methods) = methods else {
        return Err(GatewayError::ConfigParse(format!(
            "{}: expected an object of methods",
            pattern
        )));
    };

    methods
        .into_iter()
        .map(|(method, raw)| {
            let raw: RawRouteEntry = serde_json::from_value(raw)
                .map_err(|e| GatewayError::ConfigParse(format!("{} {}: {}", method, pattern, e)))?;
            let entry = raw.into_entry(pattern, &method)?;
            Ok((method, entry))
        })
        .collect()
}

//! Route Pattern Module
//!
//! Compiles path templates such as `/users/{id}` into anchored regexes and
//! extracts named parameters from matching paths.

use regex::Regex;

use crate::error::{GatewayError, Result};

// == Path Params ==
/// Parameters captured from a path, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    values: Vec<(String, String)>,
}

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name`, replacing any earlier binding of the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// == Route Pattern ==
/// A compiled route pattern.
///
/// `{name}` captures one or more non-`/` characters; everything else must
/// match literally.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    regex: Regex,
    names: Vec<String>,
}

impl RoutePattern {
    /// Compiles a path template.
    ///
    /// Fails with [`GatewayError::InvalidPattern`] on an unterminated `{`.
    pub fn compile(pattern: &str) -> Result<Self> {
        let mut expr = String::with_capacity(pattern.len() + 16);
        let mut names = Vec::new();
        let mut rest = pattern;

        expr.push('^');
        while let Some(open) = rest.find('{') {
            expr.push_str(&regex::escape(&rest[..open]));

            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| {
                GatewayError::InvalidPattern(format!("unterminated '{{' in {}", pattern))
            })?;
            names.push(after[..close].to_string());
            expr.push_str("([^/]+)");
            rest = &after[close + 1..];
        }
        expr.push_str(&regex::escape(rest));
        expr.push('$');

        let regex = Regex::new(&expr)
            .map_err(|e| GatewayError::InvalidPattern(format!("{}: {}", pattern, e)))?;

        Ok(Self { regex, names })
    }

    /// Matches the whole of `path`, returning the captured parameters.
    pub fn captures(&self, path: &str) -> Option<PathParams> {
        let caps = self.regex.captures(path)?;
        if caps.len() - 1 != self.names.len() {
            return None;
        }

        let mut params = PathParams::new();
        for (i, name) in self.names.iter().enumerate() {
            if let Some(m) = caps.get(i + 1) {
                params.insert(name.clone(), m.as_str());
            }
        }
        Some(params)
    }
}

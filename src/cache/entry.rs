//! Cache Entry Module
//!
//! Defines the captured backend response and the expiring entry wrapping it.

use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

// == Cached Response ==
/// Status, media type, encoding and body of a backend reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// Backend status code
    pub status: StatusCode,
    /// Backend `Content-Type`, if it sent one
    pub content_type: Option<HeaderValue>,
    /// Backend `Content-Encoding`; the body is stored still encoded
    pub content_encoding: Option<HeaderValue>,
    /// Full response body
    pub body: Bytes,
}

impl CachedResponse {
    /// Creates a response snapshot without a content type.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: None,
            content_encoding: None,
            body: body.into(),
        }
    }

    /// Attaches a content type.
    pub fn with_content_type(mut self, content_type: HeaderValue) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Attaches a content encoding.
    pub fn with_content_encoding(mut self, content_encoding: HeaderValue) -> Self {
        self.content_encoding = Some(content_encoding);
        self
    }
}

impl IntoResponse for CachedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        if let Some(content_type) = self.content_type {
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, content_type);
        }
        if let Some(content_encoding) = self.content_encoding {
            response
                .headers_mut()
                .insert(header::CONTENT_ENCODING, content_encoding);
        }
        response
    }
}

// == Cache Entry ==
/// A cached response with its expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored response
    pub response: CachedResponse,
    /// Insertion (or last refresh) time
    pub inserted_at: Instant,
    /// Absolute expiry time
    pub expire_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry expiring `ttl` after `now`.
    pub fn new(response: CachedResponse, ttl: Duration, now: Instant) -> Self {
        Self {
            response,
            inserted_at: now,
            expire_at: now + ttl,
        }
    }

    // == Refresh ==
    /// Replaces the response and restarts the TTL.
    pub fn refresh(&mut self, response: CachedResponse, ttl: Duration, now: Instant) {
        self.response = response;
        self.inserted_at = now;
        self.expire_at = now + ttl;
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// The entry stays valid up to and including `expire_at`; it is expired
    /// only once `now` is strictly past it.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now > self.expire_at
    }
}

//! API Gateway - pattern routing with an LRU+TTL response cache
//!
//! Matches inbound requests against an ordered route table, serves static
//! routes directly, forwards the rest to backend services and caches
//! successful GET replies.

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod router;
pub mod tasks;

pub use cache::ResponseCache;
pub use config::Config;
pub use error::{GatewayError, Result};
pub use gateway::{create_router, Gateway, GatewayState};
pub use router::RouteTable;

//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of the gateway.
//!
//! # Tasks
//! - Reaper: removes expired cache entries at a fixed interval

mod reaper;

pub use reaper::{spawn_reaper, Reaper};

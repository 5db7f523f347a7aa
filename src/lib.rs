// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod feeds;
pub mod ingest;
pub mod metrics;
pub mod reconcile;
pub mod timeutil;

pub use crate::api::{create_router, AppState};
pub use crate::error::FeedError;

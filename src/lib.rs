//! Waypost library — geolocation check-in service backed by object storage.
//!
//! This crate provides the components for running a small HTTP service that
//! accepts location check-ins from named participants on named teams,
//! persists each submission as a JSON object in a bucket-like store, and
//! serves the accumulated submissions back to an authorized caller.

use std::sync::Arc;

pub mod config;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod model;
pub mod server;
pub mod storage;

use crate::config::Config;
use crate::storage::store::ObjectStore;

/// Shared application state passed to all handlers via `axum::extract::State`.
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// Object store holding submitted records (in-memory or S3 gateway).
    pub store: Arc<dyn ObjectStore>,
}

//! ama-ce library interface
//!
//! Exposes the application state and router so integration tests can
//! drive the service end to end.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::services::{CanonicalizationJob, Classifier};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Classification service (opaque, swappable in tests)
    pub classifier: Arc<dyn Classifier>,
    /// Process-wide canonicalization job handle
    pub job: CanonicalizationJob,
    /// Classifier batch bound
    pub batch_size: usize,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, classifier: Arc<dyn Classifier>, batch_size: usize) -> Self {
        Self {
            db,
            classifier,
            job: CanonicalizationJob::new(),
            batch_size,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::canonicalization_routes())
        .merge(api::aggregation_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

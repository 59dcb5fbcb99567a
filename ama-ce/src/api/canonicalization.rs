//! Canonicalization API handlers
//!
//! POST /trigger-canonicalization, GET /canonicalization-status

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /trigger-canonicalization response
#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub message: String,
}

/// POST /trigger-canonicalization
///
/// Fire-and-forget: claims the single run slot, spawns the background
/// run and returns 202. A live run yields 409 without touching it.
pub async fn trigger_canonicalization(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<TriggerResponse>)> {
    if !state.job.try_start().await {
        return Err(ApiError::Conflict(
            "Canonicalization is already running".to_string(),
        ));
    }

    let job = state.job.clone();
    let db = state.db.clone();
    let classifier = state.classifier.clone();
    let batch_size = state.batch_size;
    tokio::spawn(async move {
        job.run(db, classifier, batch_size).await;
    });

    tracing::info!("Canonicalization run triggered");

    Ok((
        StatusCode::ACCEPTED,
        Json(TriggerResponse {
            message: "Canonicalization started".to_string(),
        }),
    ))
}

/// GET /canonicalization-status
///
/// The sole channel of run progress and error visibility.
pub async fn canonicalization_status(
    State(state): State<AppState>,
) -> Json<ama_common::models::JobStatus> {
    Json(state.job.snapshot().await)
}

/// Build canonicalization routes
pub fn canonicalization_routes() -> Router<AppState> {
    Router::new()
        .route("/trigger-canonicalization", post(trigger_canonicalization))
        .route("/canonicalization-status", get(canonicalization_status))
}

//! Aggregation and network graph API handlers
//!
//! GET /aggregate/{field_key}, GET /rebuild-network-cache,
//! GET /network-graph

use ama_common::fields;
use ama_common::models::{CountEntry, NetworkGraph};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::network;
use crate::error::{ApiError, ApiResult};
use crate::services::aggregation;
use crate::AppState;

/// Optional query parameters for GET /aggregate/{field_key}
#[derive(Debug, Deserialize)]
pub struct AggregateParams {
    /// Override the field's default mapping behavior
    pub mapped: Option<bool>,
}

/// GET /aggregate/{field_key}
///
/// Ordered counts per (normalized) value. The registry decides whether
/// mappings apply by default; `?mapped=` overrides per request.
pub async fn aggregate_field(
    State(state): State<AppState>,
    Path(field_key): Path<String>,
    Query(params): Query<AggregateParams>,
) -> ApiResult<Json<Vec<CountEntry>>> {
    let field = fields::field_by_key(&field_key)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown field: {}", field_key)))?;

    let apply_mapping = params.mapped.unwrap_or(field.canonicalize);
    let result = aggregation::aggregate(&state.db, field, apply_mapping).await?;

    Ok(Json(result))
}

/// GET /rebuild-network-cache response
#[derive(Debug, Serialize)]
pub struct RebuildResponse {
    pub message: String,
    pub nodes: usize,
    pub edges: usize,
}

/// GET /rebuild-network-cache
///
/// Synchronously recomputes the co-occurrence graph and replaces the
/// cached copy wholesale.
pub async fn rebuild_network_cache(
    State(state): State<AppState>,
) -> ApiResult<Json<RebuildResponse>> {
    let graph = aggregation::build_network_graph(&state.db).await?;
    network::replace(&state.db, &graph).await?;

    tracing::info!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "Network cache rebuilt"
    );

    Ok(Json(RebuildResponse {
        message: "Network cache rebuilt".to_string(),
        nodes: graph.nodes.len(),
        edges: graph.edges.len(),
    }))
}

/// GET /network-graph
///
/// The last successfully rebuilt graph; 404 until the first rebuild.
pub async fn network_graph(State(state): State<AppState>) -> ApiResult<Json<NetworkGraph>> {
    let graph = network::read(&state.db).await?.ok_or_else(|| {
        ApiError::NotFound(
            "Network graph not built yet. Call /rebuild-network-cache first.".to_string(),
        )
    })?;

    Ok(Json(graph))
}

/// Build aggregation routes
pub fn aggregation_routes() -> Router<AppState> {
    Router::new()
        .route("/aggregate/:field_key", get(aggregate_field))
        .route("/rebuild-network-cache", get(rebuild_network_cache))
        .route("/network-graph", get(network_graph))
}

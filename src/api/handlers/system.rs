//! System endpoints: health check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::app_state::AppState;
use crate::domain::PoolKey;

/// Per-pool health snapshot.
#[derive(Debug, Serialize)]
struct PoolHealth {
    pool_key: PoolKey,
    endpoint: String,
    size: u32,
    idle: usize,
}

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    pools: Vec<PoolHealth>,
}

/// `GET /health` — Service health status with pool occupancy.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.item_service.router().registry();
    let pools = registry
        .keys()
        .into_iter()
        .filter_map(|key| registry.get(key).ok())
        .map(|entry| PoolHealth {
            pool_key: entry.key(),
            endpoint: entry.endpoint().to_string(),
            size: entry.pool().size(),
            idle: entry.pool().num_idle(),
        })
        .collect();

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            pools,
        }),
    )
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}

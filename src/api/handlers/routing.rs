//! Routing diagnostic: which pool serves a given intent.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::domain::{Intent, ParseIntentError};
use crate::error::ServiceError;

/// `GET /routing/{intent}` — Report the pool and endpoint a unit of work
/// with `intent` is served from.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidRequest`] for an unknown intent, or a
/// [`ServiceError`] if no connection can be checked out.
pub async fn routing_probe(
    State(state): State<AppState>,
    Path(intent): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let intent: Intent = intent
        .parse()
        .map_err(|e: ParseIntentError| ServiceError::InvalidRequest(e.to_string()))?;
    let probe = state.item_service.routing_probe(intent).await?;
    Ok(Json(probe))
}

/// Routing diagnostic routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/routing/{intent}", get(routing_probe))
}

//! Item handlers: create (read-write pool) and list (read-only pool).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{CreateItemRequest, ItemDto, ItemListResponse};
use crate::app_state::AppState;
use crate::error::ServiceError;

/// `POST /items` — Create an item.
///
/// # Errors
///
/// Returns [`ServiceError`] on a blank name or a database failure.
pub async fn create_item(
    State(state): State<AppState>,
    Json(req): Json<CreateItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.item_service.create_item(&req.name).await?;
    Ok((StatusCode::CREATED, Json(ItemDto::from(item))))
}

/// `GET /items` — List all items.
///
/// # Errors
///
/// Returns [`ServiceError`] on a database failure.
pub async fn list_items(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let data: Vec<ItemDto> = state
        .item_service
        .list_items()
        .await?
        .into_iter()
        .map(ItemDto::from)
        .collect();
    let total = data.len();
    Ok(Json(ItemListResponse { data, total }))
}

/// Item routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/items", post(create_item).get(list_items))
}

//! Item request/response DTOs.

use serde::{Deserialize, Serialize};

use crate::persistence::models::Item;

/// Request body for `POST /api/v1/items`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateItemRequest {
    /// Name of the new item.
    pub name: String,
}

/// A single item as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemDto {
    /// Item UUID.
    pub id: String,
    /// Item name.
    pub name: String,
}

impl From<Item> for ItemDto {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            name: item.name,
        }
    }
}

/// Response body for `GET /api/v1/items`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemListResponse {
    /// Items ordered by name.
    pub data: Vec<ItemDto>,
    /// Number of items returned.
    pub total: usize,
}

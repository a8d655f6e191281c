//! Database models.

use serde::{Deserialize, Serialize};

/// A row of the `items` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    /// UUID v4, stored as text so the schema is portable across drivers.
    pub id: String,
    /// Item name.
    pub name: String,
}

//! SQL for the `items` table.
//!
//! Functions take a bare `AnyConnection` and never choose a pool
//! themselves; the caller hands them a routed connection.

use sqlx::AnyConnection;
use uuid::Uuid;

use super::models::Item;

/// Creates the `items` table if it does not exist.
///
/// # Errors
///
/// Returns the driver error on failure.
pub async fn create_table(conn: &mut AnyConnection) -> Result<(), sqlx::Error> {
    sqlx::query("CREATE TABLE IF NOT EXISTS items (id TEXT PRIMARY KEY, name TEXT NOT NULL)")
        .execute(conn)
        .await?;
    Ok(())
}

/// Inserts a new item with a fresh id.
///
/// # Errors
///
/// Returns the driver error on failure, including writes attempted on a
/// read-only endpoint.
pub async fn insert(conn: &mut AnyConnection, name: &str) -> Result<Item, sqlx::Error> {
    let item = Item {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
    };
    sqlx::query("INSERT INTO items (id, name) VALUES ($1, $2)")
        .bind(&item.id)
        .bind(&item.name)
        .execute(conn)
        .await?;
    Ok(item)
}

/// Returns every item ordered by name.
///
/// # Errors
///
/// Returns the driver error on failure.
pub async fn find_all(conn: &mut AnyConnection) -> Result<Vec<Item>, sqlx::Error> {
    sqlx::query_as::<_, Item>("SELECT id, name FROM items ORDER BY name, id")
        .fetch_all(conn)
        .await
}

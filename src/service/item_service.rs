//! Item service: every method is one unit of work with a declared intent.

use serde::Serialize;
use sqlx::Any;

use crate::domain::{Intent, PoolKey};
use crate::error::ServiceError;
use crate::persistence::items;
use crate::persistence::models::Item;
use crate::routing::DataSourceRouter;

/// Which pool and endpoint served a unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingProbe {
    /// Intent the unit of work was declared with.
    pub intent: Intent,
    /// Pool the connection came from.
    pub pool_key: PoolKey,
    /// Redacted endpoint of that pool.
    pub endpoint: String,
}

/// Business operations over the `items` table.
///
/// Writes are declared [`Intent::ReadWrite`] and reads
/// [`Intent::ReadOnly`]; the router picks the pool.
#[derive(Debug, Clone)]
pub struct ItemService {
    router: DataSourceRouter<Any>,
}

impl ItemService {
    /// Creates a new `ItemService`.
    #[must_use]
    pub const fn new(router: DataSourceRouter<Any>) -> Self {
        Self { router }
    }

    /// Returns the underlying router.
    #[must_use]
    pub const fn router(&self) -> &DataSourceRouter<Any> {
        &self.router
    }

    /// Creates the schema on the read-write endpoint.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] if the write pool is unavailable or the
    /// DDL fails.
    pub async fn ensure_schema(&self) -> Result<(), ServiceError> {
        self.router
            .run_with_intent(Intent::ReadWrite, |ctx, scope| {
                Box::pin(async move {
                    let conn = ctx.resolve_connection(scope).await?;
                    items::create_table(conn).await?;
                    Ok::<_, ServiceError>(())
                })
            })
            .await
    }

    /// Persists a new item through the read-write pool.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidRequest`] for a blank name, otherwise
    /// a [`ServiceError`] if the write fails.
    pub async fn create_item(&self, name: &str) -> Result<Item, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidRequest(
                "item name must not be empty".to_string(),
            ));
        }
        let name = name.to_string();

        let item = self
            .router
            .run_with_intent(Intent::ReadWrite, |ctx, scope| {
                Box::pin(async move {
                    let conn = ctx.resolve_connection(scope).await?;
                    let item = items::insert(conn, &name).await?;
                    Ok::<_, ServiceError>(item)
                })
            })
            .await?;

        tracing::info!(item_id = %item.id, "item created");
        Ok(item)
    }

    /// Lists every item through the read-only pool.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] if the read fails.
    pub async fn list_items(&self) -> Result<Vec<Item>, ServiceError> {
        self.router
            .run_with_intent(Intent::ReadOnly, |ctx, scope| {
                Box::pin(async move {
                    let conn = ctx.resolve_connection(scope).await?;
                    let found = items::find_all(conn).await?;
                    Ok::<_, ServiceError>(found)
                })
            })
            .await
    }

    /// Opens a unit of work with `intent` and reports where its connection
    /// came from. Used to verify routing against live endpoints.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] if no connection can be checked out.
    pub async fn routing_probe(&self, intent: Intent) -> Result<RoutingProbe, ServiceError> {
        self.router
            .run_with_intent(intent, |ctx, scope| {
                Box::pin(async move {
                    let conn = ctx.resolve_connection(scope).await?;
                    Ok::<_, ServiceError>(RoutingProbe {
                        intent,
                        pool_key: conn.pool_key(),
                        endpoint: conn.endpoint().to_string(),
                    })
                })
            })
            .await
    }
}

//! Entry point shared by every execution context.

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use sqlx::Database;

use super::RoutingContext;
use crate::config::RoutingConfig;
use crate::domain::{Intent, PoolKey, PoolRegistry, ScopeHandle};
use crate::error::RoutingError;

/// Read/write data source router.
///
/// Cheap to clone. Owns the validated [`PoolRegistry`]; each unit of work
/// gets its own [`RoutingContext`] so intent state is never shared between
/// concurrent callers.
pub struct DataSourceRouter<DB: Database> {
    registry: Arc<PoolRegistry<DB>>,
}

impl<DB: Database> DataSourceRouter<DB> {
    /// Wraps a fully registered pool registry.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Configuration`] or
    /// [`RoutingError::DefaultPoolUndefined`] if the registry is incomplete.
    pub fn new(registry: PoolRegistry<DB>) -> Result<Self, RoutingError> {
        registry.validate()?;
        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    /// Connects both endpoints of `config` and builds a router whose default
    /// pool is the read-write one.
    ///
    /// The read-write endpoint is connected first.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Configuration`] if either endpoint cannot be
    /// reached. Startup should abort.
    pub async fn connect(config: &RoutingConfig) -> Result<Self, RoutingError> {
        let mut registry = PoolRegistry::new();
        for key in PoolKey::ALL {
            let endpoint = config.endpoint(key);
            let pool = endpoint
                .pool_options::<DB>()
                .connect(&endpoint.url)
                .await
                .map_err(|e| {
                    RoutingError::Configuration(format!(
                        "cannot connect {key} pool at {}: {e}",
                        endpoint.redacted_url()
                    ))
                })?;
            registry.register(key, endpoint.redacted_url(), pool)?;
        }
        registry.set_default(PoolKey::ReadWrite)?;
        Self::new(registry)
    }

    /// Returns a fresh context for one execution context.
    #[must_use]
    pub fn context(&self) -> RoutingContext<DB> {
        RoutingContext::new(Arc::clone(&self.registry))
    }

    /// Runs `work` in a scope with `intent` on a fresh context.
    ///
    /// # Errors
    ///
    /// See [`RoutingContext::run_with_intent`].
    pub async fn run_with_intent<T, E, F>(&self, intent: Intent, work: F) -> Result<T, E>
    where
        F: for<'c> FnOnce(&'c mut RoutingContext<DB>, ScopeHandle) -> BoxFuture<'c, Result<T, E>>,
        E: From<RoutingError>,
    {
        let mut context = self.context();
        context.run_with_intent(intent, work).await
    }

    /// Returns the pool registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<PoolRegistry<DB>> {
        &self.registry
    }

    /// Closes both pools.
    pub async fn close(&self) {
        self.registry.close().await;
    }
}

impl<DB: Database> Clone for DataSourceRouter<DB> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<DB: Database> fmt::Debug for DataSourceRouter<DB> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSourceRouter")
            .field("registry", &self.registry)
            .finish()
    }
}

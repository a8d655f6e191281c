//! Maps a scope's intent to a pool and checks out a connection.

use std::fmt;
use std::sync::Arc;

use sqlx::Database;

use super::RoutedConnection;
use crate::domain::{IntentTracker, PoolKey, PoolRegistry, ScopeHandle};
use crate::error::RoutingError;

/// Stateless resolver over a shared [`PoolRegistry`].
///
/// Called on the first data access of a scope, never when the scope
/// begins. The caller caches the result for the rest of the scope.
pub struct RoutingResolver<DB: Database> {
    registry: Arc<PoolRegistry<DB>>,
}

impl<DB: Database> RoutingResolver<DB> {
    /// Creates a resolver over `registry`.
    #[must_use]
    pub const fn new(registry: Arc<PoolRegistry<DB>>) -> Self {
        Self { registry }
    }

    /// Returns the registry this resolver reads from.
    #[must_use]
    pub const fn registry(&self) -> &Arc<PoolRegistry<DB>> {
        &self.registry
    }

    /// Checks out a connection for `handle` from the pool matching its
    /// tracked intent and begins a transaction on it.
    ///
    /// A handle the tracker does not know routes as
    /// [`Intent::ReadWrite`](crate::domain::Intent::ReadWrite).
    ///
    /// # Errors
    ///
    /// - [`RoutingError::DefaultPoolUndefined`] if the selected key has no
    ///   pool and no default is designated.
    /// - [`RoutingError::ConnectionUnavailable`] if the checkout or `BEGIN`
    ///   fails, including acquire timeouts. There is no retry and no
    ///   fallback to the other pool.
    pub async fn resolve_connection(
        &self,
        tracker: &IntentTracker,
        handle: ScopeHandle,
    ) -> Result<RoutedConnection<DB>, RoutingError> {
        let intent = match tracker.current_intent(handle) {
            Ok(intent) => intent,
            Err(RoutingError::NoActiveScope) => {
                tracing::debug!(scope = %handle, "no active scope, using default intent");
                tracker.intent_or_default(handle)
            }
            Err(e) => return Err(e),
        };
        let requested = PoolKey::from(intent);
        let entry = self.registry.lookup(requested)?;
        let key = entry.key();

        let tx = entry
            .pool()
            .begin()
            .await
            .map_err(|source| RoutingError::ConnectionUnavailable { key, source })?;

        let connection = RoutedConnection::new(key, entry.endpoint_arc(), tx);
        tracing::debug!(
            scope = %handle,
            %intent,
            pool_key = %key,
            checkout = %connection.checkout_id(),
            "connection resolved"
        );
        Ok(connection)
    }
}

impl<DB: Database> Clone for RoutingResolver<DB> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<DB: Database> fmt::Debug for RoutingResolver<DB> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingResolver")
            .field("registry", &self.registry)
            .finish()
    }
}

//! A checked-out connection tagged with the pool it came from.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use sqlx::{Database, Transaction};
use uuid::Uuid;

use crate::domain::PoolKey;

/// Connection bound to one scope, with an open transaction.
///
/// Derefs to `DB::Connection`, so `&mut *conn` can be passed to any sqlx
/// query as an executor. Dropping it rolls back anything uncommitted and
/// returns the connection to its pool.
pub struct RoutedConnection<DB: Database> {
    checkout_id: Uuid,
    key: PoolKey,
    endpoint: Arc<str>,
    tx: Transaction<'static, DB>,
}

impl<DB: Database> RoutedConnection<DB> {
    pub(crate) fn new(key: PoolKey, endpoint: Arc<str>, tx: Transaction<'static, DB>) -> Self {
        Self {
            checkout_id: Uuid::new_v4(),
            key,
            endpoint,
            tx,
        }
    }

    /// Key of the pool this connection was checked out from.
    #[must_use]
    pub const fn pool_key(&self) -> PoolKey {
        self.key
    }

    /// Redacted endpoint of the pool this connection was checked out from.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Identifier unique to this checkout.
    ///
    /// Two handles with the same id are the same physical checkout.
    #[must_use]
    pub const fn checkout_id(&self) -> Uuid {
        self.checkout_id
    }

    /// Commits the transaction and returns the connection to its pool.
    pub(crate) async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }

    /// Rolls back the transaction and returns the connection to its pool.
    pub(crate) async fn rollback(self) -> Result<(), sqlx::Error> {
        self.tx.rollback().await
    }
}

impl<DB: Database> Deref for RoutedConnection<DB> {
    type Target = DB::Connection;

    fn deref(&self) -> &Self::Target {
        &self.tx
    }
}

impl<DB: Database> DerefMut for RoutedConnection<DB> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.tx
    }
}

impl<DB: Database> fmt::Debug for RoutedConnection<DB> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutedConnection")
            .field("checkout_id", &self.checkout_id)
            .field("pool_key", &self.key)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

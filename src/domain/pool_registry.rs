//! Connection pools addressed by [`PoolKey`].
//!
//! [`PoolRegistry`] is filled once at startup and then frozen behind an
//! `Arc`. Nothing mutates it afterwards, so it carries no lock; the pools
//! themselves synchronise checkout and checkin internally.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use sqlx::{Database, Pool};

use super::PoolKey;
use crate::error::RoutingError;

/// A pool together with the endpoint it connects to.
pub struct RegisteredPool<DB: Database> {
    key: PoolKey,
    endpoint: Arc<str>,
    pool: Pool<DB>,
}

impl<DB: Database> RegisteredPool<DB> {
    /// Key this pool was registered under.
    #[must_use]
    pub const fn key(&self) -> PoolKey {
        self.key
    }

    /// Redacted endpoint description, for logs and diagnostics.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Shared handle to the endpoint description.
    #[must_use]
    pub fn endpoint_arc(&self) -> Arc<str> {
        Arc::clone(&self.endpoint)
    }

    /// The underlying sqlx pool.
    #[must_use]
    pub const fn pool(&self) -> &Pool<DB> {
        &self.pool
    }
}

impl<DB: Database> fmt::Debug for RegisteredPool<DB> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredPool")
            .field("key", &self.key)
            .field("endpoint", &self.endpoint)
            .field("size", &self.pool.size())
            .field("idle", &self.pool.num_idle())
            .finish()
    }
}

/// Registry of the read-write and read-only pools.
///
/// # Lifecycle
///
/// 1. [`register`](Self::register) both pools.
/// 2. [`set_default`](Self::set_default), conventionally to
///    [`PoolKey::ReadWrite`].
/// 3. [`validate`](Self::validate), then share behind an `Arc`.
pub struct PoolRegistry<DB: Database> {
    pools: HashMap<PoolKey, RegisteredPool<DB>>,
    default_key: Option<PoolKey>,
}

impl<DB: Database> PoolRegistry<DB> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pools: HashMap::with_capacity(PoolKey::ALL.len()),
            default_key: None,
        }
    }

    /// Registers `pool` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Configuration`] if a pool is already
    /// registered for `key`.
    pub fn register(
        &mut self,
        key: PoolKey,
        endpoint: impl Into<String>,
        pool: Pool<DB>,
    ) -> Result<(), RoutingError> {
        if self.pools.contains_key(&key) {
            return Err(RoutingError::Configuration(format!(
                "a pool is already registered for {key}"
            )));
        }
        let endpoint: Arc<str> = Arc::from(endpoint.into());
        tracing::info!(pool_key = %key, endpoint = %endpoint, "pool registered");
        self.pools.insert(
            key,
            RegisteredPool {
                key,
                endpoint,
                pool,
            },
        );
        Ok(())
    }

    /// Designates the pool used when a key cannot be resolved.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Configuration`] if no pool is registered for
    /// `key`.
    pub fn set_default(&mut self, key: PoolKey) -> Result<(), RoutingError> {
        if !self.pools.contains_key(&key) {
            return Err(RoutingError::Configuration(format!(
                "cannot make unregistered {key} pool the default"
            )));
        }
        self.default_key = Some(key);
        Ok(())
    }

    /// Returns the pool registered for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Configuration`] if no pool is registered for
    /// `key`.
    pub fn get(&self, key: PoolKey) -> Result<&RegisteredPool<DB>, RoutingError> {
        self.pools
            .get(&key)
            .ok_or_else(|| RoutingError::Configuration(format!("no pool registered for {key}")))
    }

    /// Returns the designated default pool.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::DefaultPoolUndefined`] if no default was set.
    pub fn default_pool(&self) -> Result<&RegisteredPool<DB>, RoutingError> {
        let key = self.default_key.ok_or(RoutingError::DefaultPoolUndefined)?;
        self.get(key)
    }

    /// Returns the key of the designated default pool, if any.
    #[must_use]
    pub const fn default_key(&self) -> Option<PoolKey> {
        self.default_key
    }

    /// Returns the pool for `key`, falling back to the default pool when
    /// `key` is not registered.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::DefaultPoolUndefined`] if `key` is missing and
    /// no default was set.
    pub fn lookup(&self, key: PoolKey) -> Result<&RegisteredPool<DB>, RoutingError> {
        if let Some(entry) = self.pools.get(&key) {
            return Ok(entry);
        }
        let fallback = self.default_pool()?;
        tracing::warn!(
            requested = %key,
            fallback = %fallback.key,
            "no pool registered for key, using default pool"
        );
        Ok(fallback)
    }

    /// Checks that both pools are registered and a default is designated.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Configuration`] naming the first missing
    /// pool, or [`RoutingError::DefaultPoolUndefined`].
    pub fn validate(&self) -> Result<(), RoutingError> {
        for key in PoolKey::ALL {
            self.get(key)?;
        }
        self.default_pool().map(|_| ())
    }

    /// Keys that have a registered pool, write pool first.
    #[must_use]
    pub fn keys(&self) -> Vec<PoolKey> {
        PoolKey::ALL
            .into_iter()
            .filter(|key| self.pools.contains_key(key))
            .collect()
    }

    /// Returns the number of registered pools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Returns `true` if no pool is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Closes every registered pool, waiting for checked-out connections
    /// to come back.
    pub async fn close(&self) {
        for entry in self.pools.values() {
            entry.pool.close().await;
            tracing::info!(pool_key = %entry.key, "pool closed");
        }
    }
}

impl<DB: Database> Default for PoolRegistry<DB> {
    fn default() -> Self {
        Self::new()
    }
}

impl<DB: Database> fmt::Debug for PoolRegistry<DB> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolRegistry")
            .field("pools", &self.keys())
            .field("default_key", &self.default_key)
            .finish()
    }
}

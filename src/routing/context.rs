//! Unit-of-work scopes on one execution context.
//!
//! A [`RoutingContext`] is created per task (or thread) and drives the
//! scope lifecycle:
//!
//! ```text
//! begin_scope ──► Unresolved ──resolve_connection──► Resolved
//!                     │                                 │
//!                     └──── commit_scope / end_scope ───┴──► Closed
//! ```
//!
//! `begin_scope` only records intent. The pool is chosen on the first
//! [`resolve_connection`](RoutingContext::resolve_connection) and the
//! connection is reused until the scope closes.

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde::Serialize;
use sqlx::Database;

use super::{RoutedConnection, RoutingResolver};
use crate::domain::{Intent, IntentTracker, PoolRegistry, ScopeHandle};
use crate::error::RoutingError;

/// Lifecycle state of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeState {
    /// Intent declared, no connection bound yet.
    Unresolved,
    /// A connection is bound and reused for every access.
    Resolved,
    /// Connection released and intent cleared. Terminal.
    Closed,
}

struct ActiveScope<DB: Database> {
    handle: ScopeHandle,
    intent: Intent,
    connection: Option<RoutedConnection<DB>>,
}

/// Scope driver for one execution context.
///
/// Holds this context's [`IntentTracker`] and at most one active scope.
/// It is `Send` so it can move with its task, but it is never shared:
/// every method takes `&mut self`.
pub struct RoutingContext<DB: Database> {
    resolver: RoutingResolver<DB>,
    tracker: IntentTracker,
    active: Option<ActiveScope<DB>>,
}

impl<DB: Database> RoutingContext<DB> {
    /// Creates an idle context over `registry`.
    #[must_use]
    pub fn new(registry: Arc<PoolRegistry<DB>>) -> Self {
        Self {
            resolver: RoutingResolver::new(registry),
            tracker: IntentTracker::new(),
            active: None,
        }
    }

    /// Opens a scope with `intent`. No pool is touched.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::ScopeAlreadyActive`] if this context already
    /// has an open scope. Scopes on one context are sequential.
    pub fn begin_scope(&mut self, intent: Intent) -> Result<ScopeHandle, RoutingError> {
        let handle = ScopeHandle::new();
        self.tracker.set_intent(handle, intent)?;
        self.active = Some(ActiveScope {
            handle,
            intent,
            connection: None,
        });
        tracing::debug!(scope = %handle, %intent, "scope opened");
        Ok(handle)
    }

    /// Returns the connection bound to `handle`, checking one out on the
    /// first call.
    ///
    /// # Errors
    ///
    /// - [`RoutingError::ScopeClosed`] if `handle` is not the open scope.
    /// - [`RoutingError::ConnectionUnavailable`] if the checkout fails. The
    ///   scope stays `Unresolved` and may be retried or closed.
    pub async fn resolve_connection(
        &mut self,
        handle: ScopeHandle,
    ) -> Result<&mut RoutedConnection<DB>, RoutingError> {
        let active = match self.active.as_mut() {
            Some(active) if active.handle == handle => active,
            _ => return Err(RoutingError::ScopeClosed(handle)),
        };
        let connection = match active.connection.take() {
            Some(connection) => connection,
            None => {
                self.resolver
                    .resolve_connection(&self.tracker, handle)
                    .await?
            }
        };
        Ok(active.connection.insert(connection))
    }

    /// Commits the scope's transaction, releases its connection and closes
    /// the scope.
    ///
    /// An unresolved scope closes without touching a pool.
    ///
    /// # Errors
    ///
    /// - [`RoutingError::ScopeClosed`] if `handle` is not the open scope.
    /// - [`RoutingError::Database`] if the commit fails. The scope is closed
    ///   and the connection released regardless.
    pub async fn commit_scope(&mut self, handle: ScopeHandle) -> Result<(), RoutingError> {
        let scope = self.take_scope(handle)?;
        if let Some(connection) = scope.connection {
            let key = connection.pool_key();
            connection.commit().await?;
            tracing::debug!(scope = %handle, pool_key = %key, "scope committed");
        }
        Ok(())
    }

    /// Rolls back anything uncommitted, releases the connection and closes
    /// the scope.
    ///
    /// Never fails. Returns `false` if `handle` was not the open scope
    /// (already closed, or unknown).
    pub async fn end_scope(&mut self, handle: ScopeHandle) -> bool {
        let Ok(scope) = self.take_scope(handle) else {
            return false;
        };
        if let Some(connection) = scope.connection {
            let key = connection.pool_key();
            if let Err(e) = connection.rollback().await {
                tracing::warn!(scope = %handle, pool_key = %key, error = %e, "rollback failed");
            }
            tracing::debug!(scope = %handle, pool_key = %key, "scope ended");
        }
        true
    }

    /// Returns the lifecycle state of `handle`.
    ///
    /// Any handle that is not the open scope reports [`ScopeState::Closed`].
    #[must_use]
    pub fn scope_state(&self, handle: ScopeHandle) -> ScopeState {
        match &self.active {
            Some(active) if active.handle == handle => {
                if active.connection.is_some() {
                    ScopeState::Resolved
                } else {
                    ScopeState::Unresolved
                }
            }
            _ => ScopeState::Closed,
        }
    }

    /// Intent of the open scope, or [`Intent::ReadWrite`] when none is open.
    #[must_use]
    pub fn current_intent(&self) -> Intent {
        self.tracker.active_intent().unwrap_or_default()
    }

    /// Handle of the open scope, if any.
    #[must_use]
    pub fn active_scope(&self) -> Option<ScopeHandle> {
        self.active.as_ref().map(|active| active.handle)
    }

    /// Runs `work` inside a fresh scope declared with `intent`.
    ///
    /// `work` receives this context and the scope handle, and reaches the
    /// database through [`resolve_connection`](Self::resolve_connection).
    /// On `Ok` the scope is committed, on `Err` it is rolled back. If the
    /// returned future is dropped before completion the scope is closed and
    /// its connection released. Whatever path is taken, the context has no
    /// open scope once this returns.
    ///
    /// `work` must not close its own scope. If it does, the result is
    /// [`RoutingError::ScopeClosed`], and any scope it opened afterwards is
    /// rolled back.
    ///
    /// ```ignore
    /// let names: Result<Vec<String>, RoutingError> = ctx
    ///     .run_with_intent(Intent::ReadOnly, |ctx, scope| {
    ///         Box::pin(async move {
    ///             let conn = ctx.resolve_connection(scope).await?;
    ///             Ok(sqlx::query_scalar("SELECT name FROM items")
    ///                 .fetch_all(&mut **conn)
    ///                 .await?)
    ///         })
    ///     })
    ///     .await;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns the error produced by `work`, or a [`RoutingError`] converted
    /// into `E` if the scope cannot be opened or committed, or was closed by
    /// `work` itself.
    pub async fn run_with_intent<T, E, F>(&mut self, intent: Intent, work: F) -> Result<T, E>
    where
        F: for<'c> FnOnce(&'c mut RoutingContext<DB>, ScopeHandle) -> BoxFuture<'c, Result<T, E>>,
        E: From<RoutingError>,
    {
        let handle = self.begin_scope(intent)?;
        let mut guard = ScopeGuard {
            context: self,
            handle,
            armed: true,
        };

        let outcome = work(guard.context(), handle).await;
        guard.context().end_stray_scope(handle).await;

        let result = match outcome {
            Ok(value) => guard
                .context()
                .commit_scope(handle)
                .await
                .map(|()| value)
                .map_err(E::from),
            Err(e) => {
                guard.context().end_scope(handle).await;
                Err(e)
            }
        };
        guard.armed = false;
        result
    }

    /// Rolls back a scope that `work` left open in place of `expected`.
    async fn end_stray_scope(&mut self, expected: ScopeHandle) {
        let Some(stray) = self.active_scope().filter(|handle| *handle != expected) else {
            return;
        };
        tracing::warn!(
            scope = %expected,
            stray = %stray,
            "unit of work left another scope open, rolling it back"
        );
        self.end_scope(stray).await;
    }

    /// Closes `handle` without awaiting. Dropping the transaction makes sqlx
    /// roll it back before the connection is reused.
    fn abandon_scope(&mut self, handle: ScopeHandle) {
        if let Ok(scope) = self.take_scope(handle) {
            tracing::warn!(
                scope = %handle,
                intent = %scope.intent,
                resolved = scope.connection.is_some(),
                "scope abandoned before completion"
            );
        }
    }

    fn take_scope(&mut self, handle: ScopeHandle) -> Result<ActiveScope<DB>, RoutingError> {
        match self.active.take() {
            Some(active) if active.handle == handle => {
                self.tracker.clear_intent(handle);
                Ok(active)
            }
            other => {
                self.active = other;
                Err(RoutingError::ScopeClosed(handle))
            }
        }
    }
}

impl<DB: Database> fmt::Debug for RoutingContext<DB> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.active_scope().map(|handle| (handle, self.scope_state(handle)));
        f.debug_struct("RoutingContext")
            .field("tracker", &self.tracker)
            .field("active", &state)
            .finish()
    }
}

/// Closes the scope if `run_with_intent` is cancelled or `work` panics.
///
/// On panic the guard is dropped while unwinding.
struct ScopeGuard<'a, DB: Database> {
    context: &'a mut RoutingContext<DB>,
    handle: ScopeHandle,
    armed: bool,
}

impl<DB: Database> ScopeGuard<'_, DB> {
    fn context(&mut self) -> &mut RoutingContext<DB> {
        &mut *self.context
    }
}

impl<DB: Database> Drop for ScopeGuard<'_, DB> {
    fn drop(&mut self) {
        if self.armed {
            self.context.abandon_scope(self.handle);
        }
    }
}

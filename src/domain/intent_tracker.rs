//! Per-execution-context record of the active scope's intent.
//!
//! An [`IntentTracker`] belongs to exactly one
//! [`RoutingContext`](crate::routing::RoutingContext), which in turn belongs
//! to one task or thread. Two concurrent units of work therefore never
//! share a slot, and a context that is reused for the next unit of work
//! starts from whatever the previous scope left behind: nothing, because
//! closing a scope clears the slot.

use super::{Intent, ScopeHandle};
use crate::error::RoutingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TrackedIntent {
    handle: ScopeHandle,
    intent: Intent,
}

/// Single-slot intent store for one execution context.
///
/// Scopes are sequential: while one handle is tracked, a different handle
/// cannot be set.
#[derive(Debug, Default)]
pub struct IntentTracker {
    active: Option<TrackedIntent>,
}

impl IntentTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub const fn new() -> Self {
        Self { active: None }
    }

    /// Records `intent` for `handle`.
    ///
    /// Setting the same intent again for the active handle is a no-op.
    ///
    /// # Errors
    ///
    /// - [`RoutingError::ScopeAlreadyActive`] if another scope is tracked.
    /// - [`RoutingError::IntentConflict`] if `handle` is tracked with a
    ///   different intent.
    pub fn set_intent(&mut self, handle: ScopeHandle, intent: Intent) -> Result<(), RoutingError> {
        match self.active {
            None => {
                self.active = Some(TrackedIntent { handle, intent });
                Ok(())
            }
            Some(tracked) if tracked.handle != handle => {
                Err(RoutingError::ScopeAlreadyActive(tracked.handle))
            }
            Some(tracked) if tracked.intent != intent => Err(RoutingError::IntentConflict {
                scope: handle,
                declared: tracked.intent,
                requested: intent,
            }),
            Some(_) => Ok(()),
        }
    }

    /// Returns the intent recorded for `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::NoActiveScope`] if `handle` is not the
    /// tracked scope.
    pub fn current_intent(&self, handle: ScopeHandle) -> Result<Intent, RoutingError> {
        match self.active {
            Some(tracked) if tracked.handle == handle => Ok(tracked.intent),
            _ => Err(RoutingError::NoActiveScope),
        }
    }

    /// Returns the intent recorded for `handle`, or [`Intent::default`]
    /// when no scope is active for it.
    #[must_use]
    pub fn intent_or_default(&self, handle: ScopeHandle) -> Intent {
        self.current_intent(handle).unwrap_or_default()
    }

    /// Clears the slot if it belongs to `handle`. Returns whether it did.
    pub fn clear_intent(&mut self, handle: ScopeHandle) -> bool {
        match self.active {
            Some(tracked) if tracked.handle == handle => {
                self.active = None;
                true
            }
            _ => false,
        }
    }

    /// Handle of the tracked scope, if any.
    #[must_use]
    pub fn active_scope(&self) -> Option<ScopeHandle> {
        self.active.map(|tracked| tracked.handle)
    }

    /// Intent of the tracked scope, if any.
    #[must_use]
    pub fn active_intent(&self) -> Option<Intent> {
        self.active.map(|tracked| tracked.intent)
    }
}

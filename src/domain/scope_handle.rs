//! Type-safe unit-of-work identifier.
//!
//! [`ScopeHandle`] is a newtype wrapper around [`uuid::Uuid`] (v4). A fresh
//! handle is minted for every scope, so a closed scope can never be
//! confused with a later one on the same context.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one unit-of-work scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeHandle(uuid::Uuid);

impl ScopeHandle {
    /// Creates a new random `ScopeHandle` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ScopeHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScopeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

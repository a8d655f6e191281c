//! Read/write intent of a unit of work and the pool key it selects.
//!
//! [`Intent`] is what callers declare; [`PoolKey`] is what the
//! [`super::PoolRegistry`] is indexed by. The mapping between the two is
//! total and fixed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Declared read/write nature of a unit of work.
///
/// Defaults to [`Intent::ReadWrite`]: work that never declared an intent
/// is routed to the write-capable pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// The unit of work may write.
    #[default]
    ReadWrite,
    /// The unit of work only reads.
    ReadOnly,
}

impl Intent {
    /// Returns the pool key this intent routes to.
    #[must_use]
    pub const fn pool_key(self) -> PoolKey {
        match self {
            Self::ReadWrite => PoolKey::ReadWrite,
            Self::ReadOnly => PoolKey::ReadOnly,
        }
    }

    /// Returns the snake_case name used in logs and URLs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadWrite => "read_write",
            Self::ReadOnly => "read_only",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no [`Intent`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown intent: {0}")]
pub struct ParseIntentError(String);

impl FromStr for Intent {
    type Err = ParseIntentError;

    /// Accepts `read_write`/`read-write`/`rw` and `read_only`/`read-only`/`ro`,
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "read_write" | "read-write" | "readwrite" | "rw" => Ok(Self::ReadWrite),
            "read_only" | "read-only" | "readonly" | "ro" => Ok(Self::ReadOnly),
            _ => Err(ParseIntentError(s.to_string())),
        }
    }
}

/// Key of a registered connection pool.
///
/// Only ever derived from an [`Intent`]; there are no other valid keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolKey {
    /// The write-capable (primary) pool.
    ReadWrite,
    /// The read-only (replica) pool.
    ReadOnly,
}

impl PoolKey {
    /// Both keys, write pool first.
    pub const ALL: [Self; 2] = [Self::ReadWrite, Self::ReadOnly];

    /// Returns the snake_case name used in logs and diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadWrite => "read_write",
            Self::ReadOnly => "read_only",
        }
    }
}

impl From<Intent> for PoolKey {
    fn from(intent: Intent) -> Self {
        intent.pool_key()
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

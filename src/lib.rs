//! # readwrite-router
//!
//! Routes database work between a read-write pool and a read-only pool
//! according to the declared intent of each unit of work, so writes reach
//! the primary and reads reach the replica without callers picking an
//! endpoint.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── ItemService (service/)
//!     │
//!     ├── DataSourceRouter ── RoutingContext (routing/)
//!     │        │                  ├── IntentTracker (domain/)
//!     │        │                  └── RoutingResolver
//!     │        │
//!     └── PoolRegistry (domain/)
//!              ├── read_write ── primary
//!              └── read_only  ── replica
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let router = DataSourceRouter::<Any>::connect(&config).await?;
//! let mut ctx = router.context();
//!
//! let scope = ctx.begin_scope(Intent::ReadOnly)?;
//! let conn = ctx.resolve_connection(scope).await?; // replica checkout
//! let items = persistence::items::find_all(conn).await?;
//! ctx.end_scope(scope).await;
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod routing;
pub mod service;

pub use domain::{Intent, PoolKey, ScopeHandle};
pub use error::{RoutingError, ServiceError};
pub use routing::{DataSourceRouter, RoutedConnection, RoutingContext, ScopeState};

//! Routing layer: connection resolution and unit-of-work scopes.
//!
//! [`DataSourceRouter`] is shared; [`RoutingContext`] is per task;
//! [`RoutingResolver`] does the pool selection and checkout;
//! [`RoutedConnection`] is what callers run queries on.

pub mod connection;
pub mod context;
pub mod resolver;
pub mod router;

pub use connection::RoutedConnection;
pub use context::{RoutingContext, ScopeState};
pub use resolver::RoutingResolver;
pub use router::DataSourceRouter;

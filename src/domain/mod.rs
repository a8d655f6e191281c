//! Domain layer: intent, scope identity, intent tracking and the pool
//! registry.
//!
//! Nothing in here touches a database connection; checkout happens in
//! [`crate::routing`].

pub mod intent;
pub mod intent_tracker;
pub mod pool_registry;
pub mod scope_handle;

pub use intent::{Intent, ParseIntentError, PoolKey};
pub use intent_tracker::IntentTracker;
pub use pool_registry::{PoolRegistry, RegisteredPool};
pub use scope_handle::ScopeHandle;

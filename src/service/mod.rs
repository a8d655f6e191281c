//! Service layer: units of work over the routed pools.

pub mod item_service;

pub use item_service::{ItemService, RoutingProbe};

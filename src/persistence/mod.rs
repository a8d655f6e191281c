//! Persistence layer: the `items` table.
//!
//! Queries are written against `sqlx::Any` so the same SQL runs on the
//! PostgreSQL primary/replica pair in production and on SQLite locally.

pub mod items;
pub mod models;

//! Database layer (SQLite via sqlx)

pub mod migrations;
pub mod pool;
pub mod repos;

pub use pool::{create_memory_pool, create_pool, create_pool_with_options};
pub use repos::DbError;

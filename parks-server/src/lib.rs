//! parks-server: HTTP API for Tunisia's national parks
//!
//! Parks, species, trails, reviews, sightings and badges over SQLite. The
//! park/species relationship is held only in `park_species` and changed
//! only through [`db::repos::links`].

pub mod auth;
pub mod config;
pub mod db;
pub mod http;
pub mod models;
pub mod seed;
pub mod services;

pub use config::AppConfig;
pub use db::{create_memory_pool, create_pool, DbError};
pub use http::{build_router, run_server, ApiError, AppState, ServerConfig};

//! HTTP server layer
//!
//! Axum server with:
//! - CORS restricted to configured origins by default
//! - Request tracing, timeout and body limit
//! - Graceful shutdown
//! - JSON error responses

pub mod error;
pub mod extractors;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, run_server, AppState, ServerConfig, ServerError};

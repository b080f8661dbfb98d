//! Axum server setup
//!
//! Router assembly, middleware and graceful shutdown. Everything a handler
//! needs lives in [`AppState`], built once at startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, StatusCode};
use axum::Router;
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::routes;
use crate::auth::AuthService;
use crate::config::MAX_UPLOAD_BYTES;
use crate::services::{FileStorage, WeatherProvider};

/// Room for multipart framing around a maximum-size image
const BODY_OVERHEAD: usize = 64 * 1024;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8000)
    pub bind_addr: SocketAddr,

    /// Origins allowed by CORS when not permissive
    pub cors_origins: Vec<String>,

    /// Allow any origin. Development only.
    pub cors_permissive: bool,

    pub request_timeout: Duration,

    /// Directory served under `/uploads`
    pub upload_dir: PathBuf,

    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            cors_origins: vec![
                "http://localhost:3000".into(),
                "http://localhost:5173".into(),
            ],
            cors_permissive: false,
            request_timeout: Duration::from_secs(30),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub auth: AuthService,
    pub storage: Arc<dyn FileStorage>,
    pub weather: Arc<dyn WeatherProvider>,
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.cors_permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the full application router.
///
/// API routes live under `/api`; uploaded files are served from
/// `/uploads`.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let api = Router::new()
        .merge(routes::health::router())
        .merge(routes::auth::router())
        .merge(routes::parks::router())
        .merge(routes::species::router())
        .merge(routes::trails::router())
        .merge(routes::reviews::router())
        .merge(routes::badges::router())
        .merge(routes::sightings::router())
        .merge(routes::media::router())
        .merge(routes::weather::router());

    Router::new()
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes + BODY_OVERHEAD))
        .layer(timeout_layer(config.request_timeout))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Requests running past `timeout` are answered with 408.
fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

/// Run the HTTP server until Ctrl+C or SIGTERM.
///
/// # Example
///
/// ```ignore
/// let state = AppState { pool, auth, storage, weather };
/// run_server(state, ServerConfig::default()).await?;
/// ```
pub async fn run_server(state: AppState, config: ServerConfig) -> Result<(), ServerError> {
    let app = build_router(state, &config);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 8000);
        assert!(!config.cors_permissive);
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn invalid_origins_are_skipped() {
        let config = ServerConfig {
            cors_origins: vec!["http://localhost:3000".into(), "not a\norigin".into()],
            ..Default::default()
        };
        // Builds without panicking
        let _ = cors_layer(&config);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_requests_time_out() {
        use axum::body::Body;
        use axum::http::Request;
        use axum::routing::get;
        use tower::ServiceExt;

        let app = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    "done"
                }),
            )
            .layer(timeout_layer(Duration::from_secs(1)));

        let response = app
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }
}

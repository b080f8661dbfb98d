//! HTTP server command

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use parks_server::auth::AuthService;
use parks_server::services::{LocalStorage, OpenWeatherClient};
use parks_server::{run_server, AppConfig, AppState, ServerConfig};

#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    /// Allow any CORS origin - development only
    #[arg(long)]
    pub cors_permissive: bool,

    /// Comma-separated list of allowed CORS origins
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// Database URL (overrides DATABASE_URL)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut config = AppConfig::from_env().context("Invalid configuration")?;
    if let Some(url) = args.database_url {
        config.database.url = url;
    }

    tracing::info!(database = %config.database.url, "Starting parks API on {}", args.bind);

    let pool = super::open_database(Some(config.database.url.clone())).await?;

    let storage = LocalStorage::new(&config.storage);
    storage
        .ensure_dirs()
        .await
        .with_context(|| format!("Failed to create {}", config.storage.upload_dir.display()))?;

    let weather =
        OpenWeatherClient::new(&config.weather).context("Failed to build weather client")?;
    if config.weather.api_key.is_none() {
        tracing::warn!("OPENWEATHER_API_KEY not set, weather endpoints will return 503");
    }

    let mut server = ServerConfig {
        bind_addr: args.bind,
        cors_permissive: args.cors_permissive,
        upload_dir: config.storage.upload_dir.clone(),
        max_upload_bytes: config.storage.max_file_size,
        ..ServerConfig::default()
    };
    let origins: Vec<String> = args
        .allowed_origins
        .into_iter()
        .map(|o| o.trim().to_owned())
        .filter(|o| !o.is_empty())
        .collect();
    if !origins.is_empty() {
        server.cors_origins = origins;
    }

    let state = AppState {
        pool,
        auth: AuthService::new(config.auth),
        storage: Arc::new(storage),
        weather: Arc::new(weather),
    };

    run_server(state, server).await.context("Server error")?;

    Ok(())
}

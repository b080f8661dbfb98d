//! Application configuration
//!
//! Built once at process start from environment variables and passed by
//! value into the services that need it. Recognised variables:
//! - `DATABASE_URL` (default `sqlite://tunisia_parks.db`)
//! - `SECRET_KEY`, `ACCESS_TOKEN_EXPIRE_MINUTES` (default 60)
//! - `ADMIN_USERNAME`, `ADMIN_FULL_NAME`, `ADMIN_PASSWORD_HASH` or `ADMIN_PASSWORD`
//! - `UPLOAD_DIR` (default `uploads`)
//! - `OPENWEATHER_API_KEY`, `OPENWEATHER_BASE_URL`

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::auth::{password, AuthError};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://tunisia_parks.db";
pub const DEFAULT_OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error(transparent)]
    Auth(#[from] AuthError),
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub admin_username: String,
    pub admin_full_name: String,
    /// Argon2 PHC string. `None` disables admin login.
    pub admin_password_hash: Option<String>,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("admin_username", &self.admin_username)
            .field("admin_full_name", &self.admin_full_name)
            .field("admin_password_hash", &self.admin_password_hash.as_ref().map(|_| "<set>"))
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .finish()
    }
}

impl AuthConfig {
    /// Fixed credentials for tests and local tooling.
    pub fn with_admin(username: &str, password_hash: String, jwt_secret: &str) -> Self {
        Self {
            admin_username: username.to_owned(),
            admin_full_name: "Park Admin".into(),
            admin_password_hash: Some(password_hash),
            jwt_secret: jwt_secret.to_owned(),
            token_ttl_minutes: 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    /// URL prefix uploads are served under
    pub public_prefix: String,
    pub max_file_size: usize,
}

impl StorageConfig {
    pub fn with_dir(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            public_prefix: "/uploads".into(),
            max_file_size: MAX_UPLOAD_BYTES,
        }
    }
}

#[derive(Clone)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENWEATHER_URL.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub weather: WeatherConfig,
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// A plaintext `ADMIN_PASSWORD` is hashed here so it never outlives
    /// startup. Without `SECRET_KEY` a random secret is generated and
    /// issued tokens stop working on restart.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let database = DatabaseConfig {
            url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
        };

        let token_ttl_minutes = match var("ACCESS_TOKEN_EXPIRE_MINUTES") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|m| *m > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    var: "ACCESS_TOKEN_EXPIRE_MINUTES",
                    reason: format!("expected a positive number of minutes, got '{raw}'"),
                })?,
            None => 60,
        };

        let jwt_secret = match var("SECRET_KEY") {
            Some(secret) => secret,
            None => {
                warn!("SECRET_KEY not set, generating an ephemeral signing secret");
                format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
            }
        };

        let admin_password_hash = match (var("ADMIN_PASSWORD_HASH"), var("ADMIN_PASSWORD")) {
            (Some(hash), _) => Some(hash),
            (None, Some(plain)) => Some(password::hash_password(&plain)?),
            (None, None) => {
                warn!("Neither ADMIN_PASSWORD_HASH nor ADMIN_PASSWORD set, admin login disabled");
                None
            }
        };

        let auth = AuthConfig {
            admin_username: var("ADMIN_USERNAME").unwrap_or_else(|| "admin".into()),
            admin_full_name: var("ADMIN_FULL_NAME").unwrap_or_else(|| "Park Admin".into()),
            admin_password_hash,
            jwt_secret,
            token_ttl_minutes,
        };

        let mut storage = StorageConfig::with_dir(var("UPLOAD_DIR").unwrap_or_else(|| "uploads".into()));
        if let Some(prefix) = var("UPLOAD_PUBLIC_PREFIX") {
            storage.public_prefix = prefix.trim_end_matches('/').to_owned();
        }

        let weather = WeatherConfig {
            api_key: var("OPENWEATHER_API_KEY"),
            base_url: var("OPENWEATHER_BASE_URL").unwrap_or_else(|| DEFAULT_OPENWEATHER_URL.into()),
            ..WeatherConfig::default()
        };

        Ok(Self {
            database,
            auth,
            storage,
            weather,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = AppConfig::from_lookup(lookup(&[("SECRET_KEY", "s3cret")])).unwrap();
        assert_eq!(config.database.url, DEFAULT_DATABASE_URL);
        assert_eq!(config.auth.admin_username, "admin");
        assert_eq!(config.auth.token_ttl_minutes, 60);
        assert!(config.auth.admin_password_hash.is_none());
        assert_eq!(config.storage.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.storage.max_file_size, MAX_UPLOAD_BYTES);
        assert!(config.weather.api_key.is_none());
    }

    #[test]
    fn plaintext_password_is_hashed() {
        let config = AppConfig::from_lookup(lookup(&[
            ("SECRET_KEY", "s3cret"),
            ("ADMIN_PASSWORD", "hunter2"),
        ]))
        .unwrap();
        let hash = config.auth.admin_password_hash.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(password::verify_password("hunter2", &hash).unwrap());
    }

    #[test]
    fn rejects_bad_token_ttl() {
        let err = AppConfig::from_lookup(lookup(&[("ACCESS_TOKEN_EXPIRE_MINUTES", "soon")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "ACCESS_TOKEN_EXPIRE_MINUTES",
                ..
            }
        ));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = AppConfig::from_lookup(lookup(&[("SECRET_KEY", "do-not-print")])).unwrap();
        assert!(!format!("{:?}", config).contains("do-not-print"));
    }
}

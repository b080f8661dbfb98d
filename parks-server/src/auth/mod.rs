//! Admin authentication
//!
//! A single admin account comes from [`AuthConfig`]; there is no user
//! table. Login checks the password against the configured argon2 hash and
//! returns a bearer token. Mutating routes require that token.

pub mod jwt;
pub mod password;

use std::sync::Arc;

use serde::Serialize;

use crate::config::AuthConfig;
pub use jwt::{bearer_token, Claims, IssuedToken, TokenIssuer};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    Expired,

    #[error("incorrect username or password")]
    InvalidCredentials,

    #[error("token signing failed: {0}")]
    Token(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl AuthError {
    /// Caller-facing failures, as opposed to server faults.
    pub fn is_unauthorized(&self) -> bool {
        !matches!(self, Self::Token(_) | Self::Hashing(_))
    }
}

/// Public view of the admin account
#[derive(Debug, Clone, Serialize)]
pub struct AdminProfile {
    pub username: String,
    pub full_name: String,
}

#[derive(Clone)]
pub struct AuthService {
    config: Arc<AuthConfig>,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        let tokens = TokenIssuer::new(&config.jwt_secret, config.token_ttl_minutes);
        Self {
            config: Arc::new(config),
            tokens,
        }
    }

    pub fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let Some(hash) = self.config.admin_password_hash.as_deref() else {
            tracing::warn!("Login attempted while admin login is disabled");
            return Err(AuthError::InvalidCredentials);
        };
        let password_ok = password::verify_password(password, hash)?;
        if username != self.config.admin_username || !password_ok {
            tracing::info!(username, "Rejected admin login");
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!(username, "Admin logged in");
        self.tokens.issue(&self.config.admin_username)
    }

    /// Resolve a bearer token to the admin profile.
    pub fn authenticate(&self, token: &str) -> Result<AdminProfile, AuthError> {
        let claims = self.tokens.verify(token)?;
        if claims.sub != self.config.admin_username {
            return Err(AuthError::InvalidToken);
        }
        Ok(self.profile())
    }

    pub fn profile(&self) -> AdminProfile {
        AdminProfile {
            username: self.config.admin_username.clone(),
            full_name: self.config.admin_full_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        let hash = password::hash_password("secret").unwrap();
        AuthService::new(AuthConfig::with_admin("admin", hash, "jwt-secret"))
    }

    #[test]
    fn login_round_trip() {
        let auth = service();
        let token = auth.login("admin", "secret").unwrap();
        let profile = auth.authenticate(&token.access_token).unwrap();
        assert_eq!(profile.username, "admin");
        assert_eq!(profile.full_name, "Park Admin");
    }

    #[test]
    fn wrong_password_or_user() {
        let auth = service();
        assert!(matches!(
            auth.login("admin", "nope").unwrap_err(),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            auth.login("root", "secret").unwrap_err(),
            AuthError::InvalidCredentials
        ));
    }

    #[test]
    fn token_for_other_subject_is_rejected() {
        let auth = service();
        let foreign = TokenIssuer::new("jwt-secret", 10).issue("intruder").unwrap();
        assert!(matches!(
            auth.authenticate(&foreign.access_token).unwrap_err(),
            AuthError::InvalidToken
        ));
    }

    #[test]
    fn disabled_login() {
        let mut config = AuthConfig::with_admin("admin", String::new(), "k");
        config.admin_password_hash = None;
        let auth = AuthService::new(config);
        assert!(auth.login("admin", "").is_err());
    }
}

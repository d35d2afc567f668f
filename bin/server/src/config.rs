//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server, loaded
//! via the `config` crate from an optional `config/config.*` file overlaid by
//! environment variables (`DATABASE__HOST`, `OAUTH__CLIENT_ID`,
//! `SESSION__SECRET`, ...).
//!
//! See [`OAuthConfig`] for the identity provider settings.

use axum_extra::extract::cookie::Key;
use mesika_sso_platform_access::{FlowSettings, OAuthConfig};
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

use crate::error::StartupError;

/// Minimum length of the session secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Server configuration composed from library configs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: HttpConfig,

    /// PostgreSQL connection settings.
    pub database: DatabaseConfig,

    /// OAuth2 identity provider configuration.
    pub oauth: OAuthConfig,

    /// Session configuration.
    pub session: SessionConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Upper bound for a whole request, in seconds.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

impl HttpConfig {
    /// Returns the request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_seconds)
    }
}

/// PostgreSQL connection settings.
#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub name: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_port() -> u16 {
    5432
}

fn default_max_connections() -> u32 {
    5
}

impl DatabaseConfig {
    /// Builds the connection options for the pool.
    #[must_use]
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("port", &self.port)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Session-related configuration.
#[derive(Clone, Deserialize)]
pub struct SessionConfig {
    /// Secret the cookie encryption key is derived from.
    pub secret: String,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,

    /// Lifetime of a session waiting for the provider callback.
    #[serde(default = "default_pending_ttl_seconds")]
    pub pending_ttl_seconds: i64,

    /// Lifetime of an authenticated session.
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: i64,

    /// Interval between session cleanup runs, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,
}

fn default_secure_cookies() -> bool {
    true
}

fn default_pending_ttl_seconds() -> i64 {
    300
}

fn default_ttl_seconds() -> i64 {
    86_400
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

impl SessionConfig {
    /// Derives the cookie encryption key from the secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is shorter than [`MIN_SECRET_LEN`] bytes.
    pub fn cookie_key(&self) -> Result<Key, StartupError> {
        if self.secret.len() < MIN_SECRET_LEN {
            return Err(StartupError::Config {
                details: format!("session secret must be at least {MIN_SECRET_LEN} bytes"),
            });
        }
        Ok(Key::derive_from(self.secret.as_bytes()))
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("secure_cookies", &self.secure_cookies)
            .field("pending_ttl_seconds", &self.pending_ttl_seconds)
            .field("ttl_seconds", &self.ttl_seconds)
            .field("cleanup_interval_seconds", &self.cleanup_interval_seconds)
            .finish()
    }
}

impl ServerConfig {
    /// Loads configuration from `config/config.*` and environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::from_builder(
            config::Config::builder()
                .add_source(config::File::with_name("config/config").required(false))
                .add_source(
                    config::Environment::default()
                        .separator("__")
                        .try_parsing(true),
                ),
        )
    }

    /// Builds configuration from an already assembled source builder.
    pub fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, config::ConfigError> {
        builder.build()?.try_deserialize()
    }

    /// Returns the flow lifetimes and step timeout.
    #[must_use]
    pub fn flow_settings(&self) -> FlowSettings {
        FlowSettings {
            pending_ttl: chrono::Duration::seconds(self.session.pending_ttl_seconds),
            session_ttl: chrono::Duration::seconds(self.session.ttl_seconds),
            step_timeout: self.oauth.request_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "database": { "host": "db", "user": "sso", "password": "pw", "name": "sso" },
        "oauth": {
            "client_id": "client",
            "client_secret": "secret",
            "redirect_url": "http://localhost:8080/api/auth/callback"
        },
        "session": { "secret": "0123456789abcdef0123456789abcdef" }
    }"#;

    fn parse(json: &str) -> ServerConfig {
        ServerConfig::from_builder(
            config::Config::builder()
                .add_source(config::File::from_str(json, config::FileFormat::Json)),
        )
        .expect("config should parse")
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let config = parse(MINIMAL);

        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.server.request_timeout_seconds, 30);
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.max_connections, 5);
        assert!(config.session.secure_cookies);
        assert_eq!(config.session.pending_ttl_seconds, 300);
        assert_eq!(config.session.ttl_seconds, 86_400);
        assert_eq!(config.session.cleanup_interval_seconds, 300);
        assert_eq!(config.oauth.allowed_domain(), "mesika.org");
    }

    #[test]
    fn flow_settings_follow_config() {
        let settings = parse(MINIMAL).flow_settings();
        assert_eq!(settings.pending_ttl, chrono::Duration::seconds(300));
        assert_eq!(settings.session_ttl, chrono::Duration::hours(24));
        assert_eq!(settings.step_timeout, std::time::Duration::from_secs(10));
    }

    #[test]
    fn missing_session_secret_is_an_error() {
        let json = r#"{
            "database": { "host": "db", "user": "sso", "password": "pw", "name": "sso" },
            "oauth": { "client_id": "c", "client_secret": "s", "redirect_url": "http://x/cb" },
            "session": {}
        }"#;
        let result = ServerConfig::from_builder(
            config::Config::builder()
                .add_source(config::File::from_str(json, config::FileFormat::Json)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn short_secret_is_rejected() {
        let mut config = parse(MINIMAL);
        assert!(config.session.cookie_key().is_ok());

        config.session.secret = "too-short".to_string();
        assert!(matches!(
            config.session.cookie_key(),
            Err(StartupError::Config { .. })
        ));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = parse(MINIMAL);
        let debug = format!("{config:?}");
        assert!(!debug.contains("0123456789abcdef"));
        assert!(!debug.contains("\"pw\""));
    }
}

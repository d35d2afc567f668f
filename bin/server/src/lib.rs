//! mesika single sign-on gateway.
//!
//! This crate provides the HTTP surface of the gateway: the login page, the
//! `/api/auth` endpoints, the Google identity provider client and the
//! PostgreSQL-backed user and session stores.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod pages;

use mesika_sso_core::Result;
use mesika_sso_platform_access::{AccessPolicy, AuthFlow};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use crate::auth::{
    AppState, GoogleClient,
    db::{SessionRepository, UserRepository},
};
use crate::config::ServerConfig;
use crate::error::StartupError;

/// Connects to the database, wires the flow and serves until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the database, the provider client or the listener
/// cannot be set up, or if the server stops with an I/O error.
pub async fn run(config: ServerConfig) -> Result<(), StartupError> {
    let cookie_key = config.session.cookie_key()?;

    // Create database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect_with(config.database.connect_options())
        .await
        .map_err(|e| StartupError::Database {
            details: e.to_string(),
        })?;

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .map_err(|e| StartupError::Database {
            details: e.to_string(),
        })?;

    let sessions = SessionRepository::new(db_pool.clone());
    auth::purge_expired_sessions(&sessions).await;

    // Spawn periodic session cleanup task
    let cleanup_store = sessions.clone();
    let cleanup_interval = std::time::Duration::from_secs(config.session.cleanup_interval_seconds);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            auth::purge_expired_sessions(&cleanup_store).await;
        }
    });

    let provider = GoogleClient::new(&config.oauth).map_err(|e| StartupError::Provider {
        details: e.to_string(),
    })?;

    let flow = AuthFlow::new(
        Arc::new(provider),
        Arc::new(UserRepository::new(db_pool)),
        Arc::new(sessions),
        AccessPolicy::new(config.oauth.allowed_domain()),
        config.flow_settings(),
    );
    let state = AppState::new(flow, cookie_key, config.session.secure_cookies);
    let app = app::router(state, config.server.request_timeout());

    let address = config.server.bind_address.clone();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| StartupError::Bind {
            address: address.clone(),
            details: e.to_string(),
        })?;

    tracing::info!(
        allowed_domain = config.oauth.allowed_domain(),
        "listening on http://{}",
        address
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| StartupError::Serve {
            details: e.to_string(),
        })?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

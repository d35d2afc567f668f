//! Authentication module for the SSO server.
//!
//! This module provides:
//! - The Google OAuth2 identity provider client
//! - Database-backed user and session stores
//! - Encrypted session cookie transport
//! - Authentication extractors and the `/api/auth` handlers
//!
//! # Authorization Model
//!
//! Only verified accounts of the allowed email domain can log in. The
//! session ID in the cookie refers to a `sessions` row; the row refers to
//! the user. Both are checked on every authenticated request.

pub mod cookies;
pub mod db;
pub mod google;
pub mod middleware;
pub mod routes;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use mesika_sso_platform_access::{AuthFlow, SessionStore};

pub use google::GoogleClient;
pub use middleware::RequireAuth;
pub use routes::{callback, logout, sso, verify};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The login flow controller.
    pub flow: AuthFlow,
    /// Key the session cookie is encrypted with.
    pub cookie_key: Key,
    /// Whether cookies carry the Secure flag.
    pub secure_cookies: bool,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(flow: AuthFlow, cookie_key: Key, secure_cookies: bool) -> Self {
        Self {
            flow,
            cookie_key,
            secure_cookies,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Deletes expired sessions, logging the outcome.
pub async fn purge_expired_sessions(sessions: &dyn SessionStore) {
    match sessions.delete_expired().await {
        Ok(count) if count > 0 => {
            tracing::info!(deleted_sessions = count, "Cleaned up expired sessions");
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(error = %e, "Failed to cleanup expired sessions");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use mesika_sso_platform_access::{AuthSession, InMemorySessionStore, SessionId};

    #[tokio::test]
    async fn purge_removes_expired_sessions() {
        let store = InMemorySessionStore::new();
        let live = AuthSession::pending(SessionId::generate(), "a".to_string(), Duration::hours(1));
        let dead =
            AuthSession::pending(SessionId::generate(), "b".to_string(), Duration::seconds(-1));
        store.create(&live).await.expect("create");
        store.create(&dead).await.expect("create");

        purge_expired_sessions(&store).await;

        assert_eq!(store.len().await, 1);
        assert!(store.find(live.id()).await.expect("find").is_some());
    }
}

//! Session model shared by the flow controller and the session store.
//!
//! A session starts out *pending*: it only holds the single-use state value
//! of an in-flight login. A successful callback replaces it with a fresh
//! *authenticated* session that records the user's id and email.

use chrono::{DateTime, Duration, Utc};
use mesika_sso_core::UserId;
use serde::{Deserialize, Serialize};

use crate::state::generate_session_id;

/// Opaque identifier of a server-side session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a session ID from a string.
    #[must_use]
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Generates a fresh random session ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(generate_session_id())
    }

    /// Returns the session ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Typed view of everything the gateway keeps in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    id: SessionId,
    /// Outstanding state of a login in progress.
    pending_state: Option<String>,
    /// Authenticated user, once the login completed.
    user_id: Option<UserId>,
    /// Authenticated user's email.
    email: Option<String>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl AuthSession {
    /// Creates a pending session holding a login's state value.
    #[must_use]
    pub fn pending(id: SessionId, state: String, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id,
            pending_state: Some(state),
            user_id: None,
            email: None,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Creates an authenticated session for a user.
    #[must_use]
    pub fn authenticated(id: SessionId, user_id: UserId, email: String, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id,
            pending_state: None,
            user_id: Some(user_id),
            email: Some(email),
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Reconstitutes a session from storage.
    #[must_use]
    pub fn with_all_fields(
        id: SessionId,
        pending_state: Option<String>,
        user_id: Option<UserId>,
        email: Option<String>,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            pending_state,
            user_id,
            email,
            created_at,
            expires_at,
        }
    }

    /// Returns the session ID.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns the outstanding state value, if a login is in progress.
    #[must_use]
    pub fn pending_state(&self) -> Option<&str> {
        self.pending_state.as_deref()
    }

    /// Returns the authenticated user's ID.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Returns the authenticated user's email.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns when the session was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the session expires.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns the remaining lifetime, never negative.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        (self.expires_at - Utc::now()).max(Duration::zero())
    }

    /// Returns true if the session has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Returns true if the session belongs to a logged-in user and is live.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some() && !self.is_expired()
    }

    /// Clears the pending state if it equals `state`.
    ///
    /// Returns whether the state matched. On mismatch nothing changes.
    pub fn consume_state(&mut self, state: &str) -> bool {
        if self.is_expired() || self.pending_state.as_deref() != Some(state) {
            return false;
        }
        self.pending_state = None;
        true
    }
}

//! Persistence seams for users and sessions, plus in-memory implementations.
//!
//! The database-backed implementations live in the server crate. The
//! in-memory stores serialise every operation behind one async mutex, which
//! gives them the same atomicity the SQL stores get from transactions.

use async_trait::async_trait;
use mesika_sso_core::{Result, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::session::{AuthSession, SessionId};
use crate::user::{User, normalize_email};

/// Storage of user records keyed by email.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Finds a user by email. A missing user is `Ok(None)`, not an error.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Finds a user by internal ID.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Creates the user or applies the login to the existing record.
    ///
    /// Must be atomic per email: concurrent calls for the same email leave
    /// exactly one record, whose `id` and `created_at` come from whichever
    /// call created it.
    async fn upsert(&self, candidate: &User) -> Result<User, StoreError>;
}

/// Server-side session storage keyed by session ID.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores a new session, replacing any session with the same ID.
    async fn create(&self, session: &AuthSession) -> Result<(), StoreError>;

    /// Loads a session. Expired sessions may still be returned.
    async fn find(&self, id: &SessionId) -> Result<Option<AuthSession>, StoreError>;

    /// Atomically clears the pending state of a live session if it equals
    /// `state`. Returns whether it matched; a mismatch changes nothing.
    async fn consume_pending_state(&self, id: &SessionId, state: &str)
    -> Result<bool, StoreError>;

    /// Deletes a session. Deleting a missing session is not an error.
    async fn delete(&self, id: &SessionId) -> Result<(), StoreError>;

    /// Deletes all expired sessions, returning how many were removed.
    async fn delete_expired(&self) -> Result<u64, StoreError>;
}

/// In-memory [`UserStore`].
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<Mutex<HashMap<String, User>>>,
}

impl InMemoryUserStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored users.
    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }

    /// Returns true if no user is stored.
    pub async fn is_empty(&self) -> bool {
        self.users.lock().await.is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().await.get(&normalize_email(email)).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|user| user.id() == id)
            .cloned())
    }

    async fn upsert(&self, candidate: &User) -> Result<User, StoreError> {
        let mut users = self.users.lock().await;
        let user = users
            .entry(normalize_email(candidate.email()))
            .and_modify(|existing| existing.apply_login(candidate))
            .or_insert_with(|| candidate.clone());
        Ok(user.clone())
    }
}

/// In-memory [`SessionStore`].
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<SessionId, AuthSession>>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored sessions, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Returns true if no session is stored.
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, session: &AuthSession) -> Result<(), StoreError> {
        self.sessions
            .lock()
            .await
            .insert(session.id().clone(), session.clone());
        Ok(())
    }

    async fn find(&self, id: &SessionId) -> Result<Option<AuthSession>, StoreError> {
        Ok(self.sessions.lock().await.get(id).cloned())
    }

    async fn consume_pending_state(
        &self,
        id: &SessionId,
        state: &str,
    ) -> Result<bool, StoreError> {
        Ok(self
            .sessions
            .lock()
            .await
            .get_mut(id)
            .is_some_and(|session| session.consume_state(state)))
    }

    async fn delete(&self, id: &SessionId) -> Result<(), StoreError> {
        self.sessions.lock().await.remove(id);
        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired());
        Ok((before - sessions.len()) as u64)
    }
}

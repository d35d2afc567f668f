//! Database repositories for users and sessions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mesika_sso_core::{Result, UserId};
use mesika_sso_platform_access::{
    AuthSession, SessionId, SessionStore, StoreError, User, UserStore, user::normalize_email,
};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

const USER_COLUMNS: &str = "id, email, display_name, provider_subject_id, role, \
                            last_login_at, created_at, updated_at";

/// Row type for user queries.
#[derive(FromRow)]
struct UserRow {
    id: String,
    email: String,
    display_name: String,
    provider_subject_id: String,
    role: String,
    last_login_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn try_into_user(self) -> std::result::Result<User, StoreError> {
        let id = parse_user_id(&self.id)?;
        Ok(User::with_all_fields(
            id,
            self.email,
            self.display_name,
            self.provider_subject_id,
            self.role,
            self.last_login_at,
            self.created_at,
            self.updated_at,
        ))
    }
}

/// Row type for session queries.
#[derive(FromRow)]
struct SessionRow {
    id: String,
    pending_state: Option<String>,
    user_id: Option<String>,
    email: Option<String>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl SessionRow {
    fn try_into_session(self) -> std::result::Result<AuthSession, StoreError> {
        let user_id = self.user_id.as_deref().map(parse_user_id).transpose()?;
        Ok(AuthSession::with_all_fields(
            SessionId::new(self.id),
            self.pending_state,
            user_id,
            self.email,
            self.created_at,
            self.expires_at,
        ))
    }
}

fn parse_user_id(raw: &str) -> std::result::Result<UserId, StoreError> {
    UserId::from_str(raw).map_err(|e| StoreError::Corrupt {
        details: format!("invalid user id '{raw}': {e}"),
    })
}

fn db_error(err: sqlx::Error) -> StoreError {
    StoreError::Database {
        details: err.to_string(),
    }
}

/// Repository for user operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(normalize_email(email))
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        Ok(row.map(UserRow::try_into_user).transpose()?)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        Ok(row.map(UserRow::try_into_user).transpose()?)
    }

    async fn upsert(&self, candidate: &User) -> Result<User, StoreError> {
        let email = normalize_email(candidate.email());
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // Lock the existing row, if any, so concurrent logins queue up here.
        let existing: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 FOR UPDATE"
        ))
        .bind(&email)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;

        let row: UserRow = match existing {
            Some(row) => sqlx::query_as(&format!(
                r#"
                UPDATE users
                SET display_name = $2, provider_subject_id = $3, role = $4,
                    last_login_at = $5, updated_at = $6
                WHERE id = $1
                RETURNING {USER_COLUMNS}
                "#
            ))
            .bind(&row.id)
            .bind(candidate.display_name())
            .bind(candidate.provider_subject_id())
            .bind(candidate.role())
            .bind(candidate.last_login_at())
            .bind(candidate.updated_at())
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error)?,
            // A concurrent first login may insert between the SELECT and
            // here; the conflict clause turns that into an update.
            None => sqlx::query_as(&format!(
                r#"
                INSERT INTO users (id, email, display_name, provider_subject_id, role,
                                   last_login_at, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (email) DO UPDATE
                SET display_name = EXCLUDED.display_name,
                    provider_subject_id = EXCLUDED.provider_subject_id,
                    role = EXCLUDED.role,
                    last_login_at = EXCLUDED.last_login_at,
                    updated_at = EXCLUDED.updated_at
                RETURNING {USER_COLUMNS}
                "#
            ))
            .bind(candidate.id().to_string())
            .bind(&email)
            .bind(candidate.display_name())
            .bind(candidate.provider_subject_id())
            .bind(candidate.role())
            .bind(candidate.last_login_at())
            .bind(candidate.created_at())
            .bind(candidate.updated_at())
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error)?,
        };

        tx.commit().await.map_err(db_error)?;
        Ok(row.try_into_user()?)
    }
}

/// Repository for session operations.
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Creates a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn create(&self, session: &AuthSession) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, pending_state, user_id, email, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET pending_state = EXCLUDED.pending_state,
                user_id = EXCLUDED.user_id,
                email = EXCLUDED.email,
                created_at = EXCLUDED.created_at,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(session.id().as_str())
        .bind(session.pending_state())
        .bind(session.user_id().map(|id| id.to_string()))
        .bind(session.email())
        .bind(session.created_at())
        .bind(session.expires_at())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn find(&self, id: &SessionId) -> Result<Option<AuthSession>, StoreError> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, pending_state, user_id, email, created_at, expires_at
            FROM sessions
            WHERE id = $1 AND expires_at > NOW()
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(SessionRow::try_into_session).transpose()?)
    }

    async fn consume_pending_state(
        &self,
        id: &SessionId,
        state: &str,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET pending_state = NULL
            WHERE id = $1 AND pending_state = $2 AND expires_at > NOW()
            "#,
        )
        .bind(id.as_str())
        .bind(state)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: &SessionId) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE expires_at <= NOW()
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected())
    }
}

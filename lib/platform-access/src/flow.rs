//! The login flow controller.
//!
//! [`AuthFlow`] drives the state machine described by [`FlowStage`]:
//!
//! 1. `begin_login` issues a state value, stores it in a new pending session
//!    and returns the provider URL.
//! 2. `complete_login` consumes the state (single use, even if later steps
//!    fail), exchanges the code, fetches the profile, applies the access
//!    policy, reconciles the user record and establishes a fresh
//!    authenticated session.
//!
//! Every blocking step is bounded by the configured step timeout. No lock is
//! held across provider calls; the only shared state is the user store and
//! the session store.

use chrono::{Duration, Utc};
use mesika_sso_core::UserId;
use rootcause::Report;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::{CallbackData, FlowStage, LoginInitiation, LoginOutcome};
use crate::error::{AuthFlowError, StoreError};
use crate::policy::AccessPolicy;
use crate::provider::{IdentityProvider, ProviderProfile};
use crate::session::{AuthSession, SessionId};
use crate::state::generate_state;
use crate::store::{SessionStore, UserStore};
use crate::user::User;

/// Lifetimes and limits of the login flow.
#[derive(Debug, Clone)]
pub struct FlowSettings {
    /// Lifetime of a pending session.
    pub pending_ttl: Duration,
    /// Lifetime of an authenticated session.
    pub session_ttl: Duration,
    /// Upper bound for each blocking step.
    pub step_timeout: std::time::Duration,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            pending_ttl: Duration::seconds(300),
            session_ttl: Duration::hours(24),
            step_timeout: std::time::Duration::from_secs(10),
        }
    }
}

/// Orchestrates login, session verification and logout.
#[derive(Clone)]
pub struct AuthFlow {
    provider: Arc<dyn IdentityProvider>,
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    policy: AccessPolicy,
    settings: FlowSettings,
}

impl AuthFlow {
    /// Creates a flow controller from its collaborators.
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        policy: AccessPolicy,
        settings: FlowSettings,
    ) -> Self {
        Self {
            provider,
            users,
            sessions,
            policy,
            settings,
        }
    }

    /// Returns the flow settings.
    #[must_use]
    pub fn settings(&self) -> &FlowSettings {
        &self.settings
    }

    /// Returns the access policy.
    #[must_use]
    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Starts a login: `Idle -> StateIssued`.
    ///
    /// Any session the client presented is discarded and replaced by a new
    /// pending session.
    pub async fn begin_login(
        &self,
        current: Option<&SessionId>,
    ) -> Result<LoginInitiation, AuthFlowError> {
        if let Some(prior) = current {
            self.discard_session(prior).await;
        }

        let state = generate_state();
        let session = AuthSession::pending(
            SessionId::generate(),
            state.clone(),
            self.settings.pending_ttl,
        );

        self.within(
            "store pending session",
            async {
                self.sessions
                    .create(&session)
                    .await
                    .map_err(session_error)
            },
            |details| AuthFlowError::SessionError { details },
        )
        .await?;

        let authorization_url = self.provider.authorization_url(&state);
        debug!(stage = %FlowStage::StateIssued, "issued login state");

        Ok(LoginInitiation {
            session,
            authorization_url,
        })
    }

    /// Completes a login from the provider callback.
    ///
    /// On success the pending session is deleted and a new authenticated
    /// session is returned. On failure the state stays consumed.
    pub async fn complete_login(
        &self,
        current: Option<&SessionId>,
        callback: &CallbackData,
    ) -> Result<LoginOutcome, AuthFlowError> {
        let result = self.run_callback(current, callback).await;
        if let Err(err) = &result {
            match err {
                AuthFlowError::UserCreationFailed { .. } | AuthFlowError::SessionError { .. } => {
                    tracing::error!(error = %err, code = err.code(), "login failed");
                }
                _ => warn!(error = %err, code = err.code(), "login rejected"),
            }
        }
        result
    }

    async fn run_callback(
        &self,
        current: Option<&SessionId>,
        callback: &CallbackData,
    ) -> Result<LoginOutcome, AuthFlowError> {
        let session_id = current.ok_or(AuthFlowError::InvalidState)?;

        // StateIssued -> CallbackReceived
        let consumed = self
            .within(
                "consume state",
                async {
                    self.sessions
                        .consume_pending_state(session_id, &callback.state)
                        .await
                        .map_err(session_error)
                },
                |details| AuthFlowError::SessionError { details },
            )
            .await?;
        if !consumed {
            return Err(AuthFlowError::InvalidState);
        }
        debug!(stage = %FlowStage::CallbackReceived, "state consumed");

        if callback.code.is_empty() {
            return Err(AuthFlowError::TokenExchangeFailed {
                details: "callback carried no authorization code".to_string(),
            });
        }

        // CallbackReceived -> TokenExchanged
        let token = self
            .within(
                "code exchange",
                async {
                    self.provider
                        .exchange_code(&callback.code)
                        .await
                        .map_err(AuthFlowError::from)
                },
                |details| AuthFlowError::TokenExchangeFailed { details },
            )
            .await?;
        if !token.is_valid_at(Utc::now()) {
            return Err(AuthFlowError::InvalidToken {
                reason: "token is empty or already expired".to_string(),
            });
        }
        debug!(stage = %FlowStage::TokenExchanged, "code exchanged");

        // TokenExchanged -> ProfileFetched
        let profile = self
            .within(
                "profile fetch",
                async {
                    self.provider
                        .fetch_profile(&token)
                        .await
                        .map_err(AuthFlowError::from)
                },
                |details| AuthFlowError::NetworkFailure { details },
            )
            .await?;
        drop(token);
        debug!(stage = %FlowStage::ProfileFetched, "profile fetched");

        // ProfileFetched -> Authorized
        self.policy.authorize(&profile)?;
        debug!(stage = %FlowStage::Authorized, "profile authorized");

        // Authorized -> SessionEstablished
        let user = self.reconcile(&profile).await?;
        let session = self.establish_session(session_id, &user).await?;
        info!(
            stage = %FlowStage::SessionEstablished,
            user_id = %user.id(),
            "login completed"
        );

        Ok(LoginOutcome { user, session })
    }

    /// Creates or updates the user record for an authorized profile.
    ///
    /// Safe to call concurrently for the same email: the store serialises
    /// the upsert so only one record survives.
    pub async fn reconcile(&self, profile: &ProviderProfile) -> Result<User, AuthFlowError> {
        let candidate = User::from_profile(profile);
        self.within(
            "user upsert",
            async {
                self.users
                    .upsert(&candidate)
                    .await
                    .map_err(|e| AuthFlowError::UserCreationFailed {
                        details: e.to_string(),
                    })
            },
            |details| AuthFlowError::UserCreationFailed { details },
        )
        .await
    }

    async fn establish_session(
        &self,
        pending: &SessionId,
        user: &User,
    ) -> Result<AuthSession, AuthFlowError> {
        let session = AuthSession::authenticated(
            SessionId::generate(),
            user.id(),
            user.email().to_string(),
            self.settings.session_ttl,
        );

        self.within(
            "establish session",
            async {
                self.sessions.delete(pending).await.map_err(session_error)?;
                self.sessions.create(&session).await.map_err(session_error)
            },
            |details| AuthFlowError::SessionError { details },
        )
        .await?;

        Ok(session)
    }

    /// Resolves the presented session to its user.
    ///
    /// A missing, expired, unauthenticated or unreadable session and a
    /// missing user are all reported as `SessionInvalid`.
    pub async fn verify_session(
        &self,
        current: Option<&SessionId>,
    ) -> Result<(AuthSession, User), AuthFlowError> {
        let session_id = current.ok_or(AuthFlowError::SessionInvalid)?;

        let session = self
            .within(
                "session lookup",
                async {
                    match self.sessions.find(session_id).await {
                        Ok(Some(session)) => Ok(session),
                        Ok(None) => Err(AuthFlowError::SessionInvalid),
                        Err(e) => {
                            warn!(error = %e, "session lookup failed");
                            Err(AuthFlowError::SessionInvalid)
                        }
                    }
                },
                lookup_timed_out,
            )
            .await?;

        let user_id = match session.user_id() {
            Some(user_id) if session.is_authenticated() => user_id,
            _ => return Err(AuthFlowError::SessionInvalid),
        };

        let user = self.verify_user(user_id).await?;
        Ok((session, user))
    }

    /// Looks up the user an authenticated session refers to.
    pub async fn verify_user(&self, user_id: UserId) -> Result<User, AuthFlowError> {
        self.within(
            "user lookup",
            async {
                match self.users.find_by_id(user_id).await {
                    Ok(Some(user)) => Ok(user),
                    Ok(None) => {
                        debug!(%user_id, "session refers to unknown user");
                        Err(AuthFlowError::SessionInvalid)
                    }
                    Err(e) => {
                        warn!(error = %e, %user_id, "user lookup failed");
                        Err(AuthFlowError::SessionInvalid)
                    }
                }
            },
            lookup_timed_out,
        )
        .await
    }

    /// Clears the presented session, whatever its state.
    pub async fn logout(&self, current: Option<&SessionId>) {
        if let Some(session_id) = current {
            self.discard_session(session_id).await;
        }
    }

    async fn discard_session(&self, session_id: &SessionId) {
        if let Err(e) = self.sessions.delete(session_id).await {
            warn!(error = %e, "failed to delete session");
        }
    }

    async fn within<T, F>(
        &self,
        step: &'static str,
        future: F,
        on_timeout: impl FnOnce(String) -> AuthFlowError,
    ) -> Result<T, AuthFlowError>
    where
        F: Future<Output = Result<T, AuthFlowError>>,
    {
        match tokio::time::timeout(self.settings.step_timeout, future).await {
            Ok(result) => result,
            Err(_) => Err(on_timeout(format!(
                "{step} timed out after {:?}",
                self.settings.step_timeout
            ))),
        }
    }
}

fn lookup_timed_out(details: String) -> AuthFlowError {
    warn!(%details, "verification lookup timed out");
    AuthFlowError::SessionInvalid
}

fn session_error(err: Report<StoreError>) -> AuthFlowError {
    AuthFlowError::SessionError {
        details: err.to_string(),
    }
}

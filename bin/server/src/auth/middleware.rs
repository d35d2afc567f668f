//! Authentication extractors for Axum.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::PrivateCookieJar;
use mesika_sso_platform_access::{AuthSession, User};

use super::{AppState, cookies};
use crate::error::ApiError;

/// Extractor for requiring an authenticated user.
///
/// Rejects with `401 SESSION_INVALID` when the cookie is missing, does not
/// decrypt, or refers to an expired or unknown session or user.
pub struct RequireAuth {
    pub session: AuthSession,
    pub user: User,
}

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let jar = PrivateCookieJar::from_headers(&parts.headers, app_state.cookie_key.clone());
        let session_id = cookies::session_id(&jar);

        let (session, user) = app_state.flow.verify_session(session_id.as_ref()).await?;
        Ok(RequireAuth { session, user })
    }
}

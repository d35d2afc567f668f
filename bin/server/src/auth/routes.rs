//! Authentication routes for login, callback, verification and logout.

use axum::{
    Json,
    extract::{Query, State},
    response::Redirect,
};
use axum_extra::extract::PrivateCookieJar;
use mesika_sso_platform_access::{AuthFlowError, CallbackData, User};
use serde::{Deserialize, Serialize};

use super::{AppState, RequireAuth, cookies};
use crate::error::ApiError;

/// Query parameters for the provider callback.
#[derive(Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    /// Set by the provider when the user declined or the request was invalid.
    error: Option<String>,
}

/// Public view of a user.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub email: String,
    pub name: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            email: user.email().to_string(),
            name: user.display_name().to_string(),
        }
    }
}

/// Body of a successful callback.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub user: UserSummary,
}

/// Body of a successful verification.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub authenticated: bool,
    pub user: UserSummary,
}

/// Body of a plain acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Initiates the login flow by redirecting to the identity provider.
pub async fn sso(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Redirect), ApiError> {
    let current = cookies::session_id(&jar);
    let initiation = state.flow.begin_login(current.as_ref()).await?;

    let jar = jar.add(cookies::session_cookie(
        &initiation.session,
        state.secure_cookies,
    ));
    Ok((jar, Redirect::temporary(&initiation.authorization_url)))
}

/// Handles the callback after the user authenticates with the identity provider.
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Json<LoginResponse>), ApiError> {
    if let Some(error) = &query.error {
        tracing::warn!(provider_error = %error, "provider reported an error on callback");
    }
    let returned_state = query.state.ok_or(AuthFlowError::InvalidState)?;
    let data = CallbackData::new(query.code.unwrap_or_default(), returned_state);

    let current = cookies::session_id(&jar);
    let outcome = state.flow.complete_login(current.as_ref(), &data).await?;

    let jar = jar.add(cookies::session_cookie(&outcome.session, state.secure_cookies));
    Ok((
        jar,
        Json(LoginResponse {
            message: "Successfully authenticated",
            user: UserSummary::from(&outcome.user),
        }),
    ))
}

/// Reports the authenticated user.
pub async fn verify(RequireAuth { user, .. }: RequireAuth) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        authenticated: true,
        user: UserSummary::from(&user),
    })
}

/// Logs out the user by deleting their session.
pub async fn logout(
    State(state): State<AppState>,
    RequireAuth { session, .. }: RequireAuth,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Json<MessageResponse>) {
    state.flow.logout(Some(session.id())).await;

    (
        jar.remove(cookies::removal_cookie()),
        Json(MessageResponse {
            message: "Successfully logged out",
        }),
    )
}

//! Session cookie transport.
//!
//! The cookie only carries the opaque session ID, encrypted and
//! authenticated by `PrivateCookieJar`. A cookie that fails to decrypt reads
//! as absent.

use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use mesika_sso_platform_access::{AuthSession, SessionId};
use time::Duration as TimeDuration;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "auth-session";

/// Reads the session ID from the jar.
pub fn session_id(jar: &PrivateCookieJar) -> Option<SessionId> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .map(SessionId::new)
}

/// Builds the cookie for a session, living exactly as long as the session.
pub fn session_cookie(session: &AuthSession, secure: bool) -> Cookie<'static> {
    let lifetime = (session.expires_at() - session.created_at()).num_seconds();
    Cookie::build((SESSION_COOKIE, session.id().as_str().to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(TimeDuration::seconds(lifetime))
        .build()
}

/// Builds the cookie passed to `PrivateCookieJar::remove`.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

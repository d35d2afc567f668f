//! HTTP router.

use axum::{
    Router,
    routing::{get, post},
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::{self, AppState};
use crate::pages;

/// Builds the application router.
///
/// Every request is traced and bounded by `request_timeout`; a request that
/// runs out of time is dropped, which cancels its outbound provider calls.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(pages::login_page))
        .route("/api/auth/sso", get(auth::sso))
        .route("/api/auth/callback", get(auth::callback))
        .route("/api/auth/verify", get(auth::verify))
        .route("/api/auth/logout", post(auth::logout))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .with_state(state)
}

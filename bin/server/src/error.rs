//! Error types for the HTTP surface and for process start-up.
//!
//! Flow failures reach clients only as `{code, message}` JSON. The wrapped
//! cause stays in the server logs.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mesika_sso_platform_access::AuthFlowError;
use serde::Serialize;
use std::fmt;

/// Errors that prevent the server from starting.
#[derive(Debug)]
pub enum StartupError {
    /// Configuration is missing or invalid.
    Config { details: String },
    /// The database could not be reached or migrated.
    Database { details: String },
    /// The identity provider client could not be built.
    Provider { details: String },
    /// The listener could not be bound.
    Bind { address: String, details: String },
    /// The server stopped with an I/O error.
    Serve { details: String },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "invalid configuration: {details}"),
            Self::Database { details } => write!(f, "database error: {details}"),
            Self::Provider { details } => write!(f, "identity provider setup failed: {details}"),
            Self::Bind { address, details } => {
                write!(f, "failed to bind to '{address}': {details}")
            }
            Self::Serve { details } => write!(f, "server error: {details}"),
        }
    }
}

impl std::error::Error for StartupError {}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: &'static str,
}

/// A flow error on its way to the client.
#[derive(Debug)]
pub struct ApiError(pub AuthFlowError);

impl ApiError {
    /// Returns the HTTP status for the wrapped error kind.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AuthFlowError::InvalidState | AuthFlowError::TokenExchangeFailed { .. } => {
                StatusCode::BAD_REQUEST
            }
            AuthFlowError::InvalidToken { .. }
            | AuthFlowError::UnverifiedEmail { .. }
            | AuthFlowError::InvalidDomain { .. }
            | AuthFlowError::SessionInvalid => StatusCode::UNAUTHORIZED,
            AuthFlowError::UserCreationFailed { .. } | AuthFlowError::SessionError { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AuthFlowError::InvalidResponse { .. } => StatusCode::BAD_GATEWAY,
            AuthFlowError::NetworkFailure { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<AuthFlowError> for ApiError {
    fn from(err: AuthFlowError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.0.code(),
            message: self.0.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AuthFlowError) -> StatusCode {
        ApiError(err).status()
    }

    #[test]
    fn status_table() {
        let details = || "x".to_string();

        assert_eq!(status_of(AuthFlowError::InvalidState), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(AuthFlowError::TokenExchangeFailed { details: details() }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AuthFlowError::InvalidToken { reason: details() }),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AuthFlowError::UnverifiedEmail { email: details() }),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AuthFlowError::InvalidDomain { email: details() }),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_of(AuthFlowError::SessionInvalid), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(AuthFlowError::UserCreationFailed { details: details() }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(AuthFlowError::SessionError { details: details() }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(AuthFlowError::InvalidResponse { details: details() }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(AuthFlowError::NetworkFailure { details: details() }),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn startup_error_display() {
        let err = StartupError::Bind {
            address: "0.0.0.0:8080".to_string(),
            details: "address in use".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to bind to '0.0.0.0:8080': address in use"
        );
    }
}

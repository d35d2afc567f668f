//! Error types for the platform-access crate.
//!
//! - `AuthFlowError`: the tagged outcome of every rejected login step. Callers
//!   switch on the variant (or its [`code`](AuthFlowError::code)) instead of
//!   probing the cause.
//! - `ProviderError`: failures talking to the identity provider.
//! - `StoreError`: failures of the user or session store, reported through
//!   rootcause `Report<StoreError>`.

use std::fmt;

/// Errors that end a login, verify or logout flow.
///
/// The `Display` form carries the wrapped cause for server-side logs. Only
/// [`code`](Self::code) and [`public_message`](Self::public_message) may be
/// shown to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFlowError {
    /// The callback state was missing, did not match, or was already used.
    InvalidState,
    /// The authorization code could not be exchanged for a token.
    TokenExchangeFailed { details: String },
    /// The provider returned an empty or already expired token.
    InvalidToken { reason: String },
    /// Transport failure while talking to the provider.
    NetworkFailure { details: String },
    /// The provider answered with an unexpected status or body.
    InvalidResponse { details: String },
    /// The provider has not verified the email address.
    UnverifiedEmail { email: String },
    /// The email does not belong to the allow-listed domain.
    InvalidDomain { email: String },
    /// The user record could not be created or updated.
    UserCreationFailed { details: String },
    /// The session store failed to load or save.
    SessionError { details: String },
    /// The session does not reference a valid user.
    SessionInvalid,
}

impl AuthFlowError {
    /// Returns the stable machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidState => "INVALID_STATE",
            Self::TokenExchangeFailed { .. } => "TOKEN_EXCHANGE_FAILED",
            Self::InvalidToken { .. } => "INVALID_TOKEN",
            Self::NetworkFailure { .. } => "NETWORK_FAILURE",
            Self::InvalidResponse { .. } => "INVALID_RESPONSE",
            Self::UnverifiedEmail { .. } => "UNVERIFIED_EMAIL",
            Self::InvalidDomain { .. } => "INVALID_DOMAIN",
            Self::UserCreationFailed { .. } => "USER_CREATION_FAILED",
            Self::SessionError { .. } => "SESSION_ERROR",
            Self::SessionInvalid => "SESSION_INVALID",
        }
    }

    /// Returns a client-safe, human-readable message.
    #[must_use]
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidState => "Invalid state parameter",
            Self::TokenExchangeFailed { .. } => "Failed to exchange auth code for token",
            Self::InvalidToken { .. } => "Invalid or expired token",
            Self::NetworkFailure { .. } => "Failed to reach the identity provider",
            Self::InvalidResponse { .. } => "Invalid response from the identity provider",
            Self::UnverifiedEmail { .. } => "Email address is not verified",
            Self::InvalidDomain { .. } => "Email domain is not allowed",
            Self::UserCreationFailed { .. } => "Failed to create or update user",
            Self::SessionError { .. } => "Failed to save session",
            Self::SessionInvalid => "Invalid or expired session",
        }
    }
}

impl fmt::Display for AuthFlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidState => write!(f, "invalid or replayed state parameter"),
            Self::TokenExchangeFailed { details } => {
                write!(f, "token exchange failed: {details}")
            }
            Self::InvalidToken { reason } => write!(f, "invalid token: {reason}"),
            Self::NetworkFailure { details } => {
                write!(f, "network failure talking to provider: {details}")
            }
            Self::InvalidResponse { details } => {
                write!(f, "invalid provider response: {details}")
            }
            Self::UnverifiedEmail { email } => write!(f, "email '{email}' is not verified"),
            Self::InvalidDomain { email } => {
                write!(f, "email '{email}' is outside the allowed domain")
            }
            Self::UserCreationFailed { details } => {
                write!(f, "user reconciliation failed: {details}")
            }
            Self::SessionError { details } => write!(f, "session store error: {details}"),
            Self::SessionInvalid => write!(f, "session is invalid"),
        }
    }
}

impl std::error::Error for AuthFlowError {}

/// Errors from the identity provider client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Invalid endpoint URLs or client construction failure.
    Configuration(String),
    /// The token endpoint rejected the code or could not be reached.
    TokenExchange(String),
    /// Request construction or transport failure.
    Network(String),
    /// Non-2xx status or a body that does not decode.
    InvalidResponse { status: Option<u16>, details: String },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "provider configuration error: {msg}"),
            Self::TokenExchange(msg) => write!(f, "token exchange error: {msg}"),
            Self::Network(msg) => write!(f, "provider network error: {msg}"),
            Self::InvalidResponse {
                status: Some(status),
                details,
            } => write!(f, "invalid provider response (status {status}): {details}"),
            Self::InvalidResponse {
                status: None,
                details,
            } => write!(f, "invalid provider response: {details}"),
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<ProviderError> for AuthFlowError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::TokenExchange(_) | ProviderError::Configuration(_) => {
                Self::TokenExchangeFailed {
                    details: err.to_string(),
                }
            }
            ProviderError::Network(_) => Self::NetworkFailure {
                details: err.to_string(),
            },
            ProviderError::InvalidResponse { .. } => Self::InvalidResponse {
                details: err.to_string(),
            },
        }
    }
}

/// Errors from the user and session stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing database failed.
    Database { details: String },
    /// A stored row could not be turned back into a domain value.
    Corrupt { details: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database { details } => write!(f, "database error: {details}"),
            Self::Corrupt { details } => write!(f, "corrupt stored record: {details}"),
        }
    }
}

impl std::error::Error for StoreError {}

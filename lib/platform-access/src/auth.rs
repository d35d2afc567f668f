//! Inputs and outputs of the login flow.

use std::fmt;

use crate::session::AuthSession;
use crate::user::User;

/// Steps of the login state machine, in the order they run.
///
/// A flow only moves forward; any failure ends it as a rejection carrying an
/// [`AuthFlowError`](crate::AuthFlowError).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FlowStage {
    Idle,
    StateIssued,
    CallbackReceived,
    TokenExchanged,
    ProfileFetched,
    Authorized,
    SessionEstablished,
}

impl FlowStage {
    /// Returns the stage name used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::StateIssued => "state_issued",
            Self::CallbackReceived => "callback_received",
            Self::TokenExchanged => "token_exchanged",
            Self::ProfileFetched => "profile_fetched",
            Self::Authorized => "authorized",
            Self::SessionEstablished => "session_established",
        }
    }
}

impl fmt::Display for FlowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of starting a login.
#[derive(Debug, Clone)]
pub struct LoginInitiation {
    /// The pending session holding the issued state.
    pub session: AuthSession,
    /// Provider URL to redirect the browser to.
    pub authorization_url: String,
}

/// Query parameters the provider sends back to the callback.
#[derive(Clone, PartialEq, Eq)]
pub struct CallbackData {
    /// Authorization code.
    pub code: String,
    /// State value that must match the one issued.
    pub state: String,
}

impl CallbackData {
    /// Creates callback data.
    #[must_use]
    pub fn new(code: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            state: state.into(),
        }
    }
}

// Neither the code nor the state belongs in logs.
impl fmt::Debug for CallbackData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackData").finish_non_exhaustive()
    }
}

/// Result of a completed login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// The reconciled user record.
    pub user: User,
    /// The freshly established authenticated session.
    pub session: AuthSession,
}

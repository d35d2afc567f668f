//! Identity provider seam.
//!
//! The flow controller talks to the external OAuth2 provider only through
//! [`IdentityProvider`]. Tokens and profiles are owned by a single flow
//! invocation and never persisted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ProviderError;

/// Access token obtained from the provider's token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderToken {
    access_token: String,
    expiry: Option<DateTime<Utc>>,
    scope: Vec<String>,
}

impl ProviderToken {
    /// Creates a token.
    #[must_use]
    pub fn new(access_token: String, expiry: Option<DateTime<Utc>>, scope: Vec<String>) -> Self {
        Self {
            access_token,
            expiry,
            scope,
        }
    }

    /// Returns the provider-opaque access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns when the token expires, if the provider said so.
    #[must_use]
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expiry
    }

    /// Returns the granted scopes.
    #[must_use]
    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    /// Returns true if the token is non-empty and not expired at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.trim().is_empty() && self.expiry.is_none_or(|expiry| expiry > now)
    }
}

// Keeps the secret out of logs.
impl std::fmt::Debug for ProviderToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderToken")
            .field("access_token", &"<redacted>")
            .field("expiry", &self.expiry)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Verified profile claims returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    /// Provider-stable unique identifier.
    pub subject_id: String,
    /// Email address as reported by the provider.
    pub email: String,
    /// Whether the provider has verified the email.
    pub email_verified: bool,
    /// Display name.
    pub display_name: String,
    /// Hosted (workspace) domain, if any.
    pub hosted_domain: Option<String>,
}

/// Client for the external OAuth2 identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Builds the authorization URL the browser is redirected to.
    fn authorization_url(&self, state: &str) -> String;

    /// Exchanges a single-use authorization code for an access token.
    ///
    /// Implementations must not retry: a transport error may already have
    /// consumed the code.
    async fn exchange_code(&self, code: &str) -> Result<ProviderToken, ProviderError>;

    /// Fetches the profile for the token's owner.
    async fn fetch_profile(&self, token: &ProviderToken) -> Result<ProviderProfile, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn token_without_expiry_is_valid() {
        let token = ProviderToken::new("abc".to_string(), None, Vec::new());
        assert!(token.is_valid_at(Utc::now()));
    }

    #[test]
    fn expired_token_is_invalid() {
        let now = Utc::now();
        let token = ProviderToken::new("abc".to_string(), Some(now - Duration::seconds(1)), vec![]);
        assert!(!token.is_valid_at(now));
    }

    #[test]
    fn empty_token_is_invalid() {
        let token = ProviderToken::new("  ".to_string(), None, Vec::new());
        assert!(!token.is_valid_at(Utc::now()));
    }

    #[test]
    fn debug_redacts_access_token() {
        let token = ProviderToken::new("super-secret".to_string(), None, Vec::new());
        assert!(!format!("{token:?}").contains("super-secret"));
    }
}

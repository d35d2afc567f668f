//! Authorization policy applied to provider profiles.
//!
//! A profile is admitted only if the provider verified its email and the
//! email's domain equals the allow-listed domain exactly.

use crate::error::AuthFlowError;
use crate::provider::ProviderProfile;
use crate::user::normalize_email;

/// Single-domain access policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    allowed_domain: String,
}

impl AccessPolicy {
    /// Creates a policy for the given domain (with or without a leading `@`).
    #[must_use]
    pub fn new(allowed_domain: &str) -> Self {
        let domain = allowed_domain.trim().trim_start_matches('@');
        Self {
            allowed_domain: domain.to_lowercase(),
        }
    }

    /// Returns the allowed domain.
    #[must_use]
    pub fn allowed_domain(&self) -> &str {
        &self.allowed_domain
    }

    /// Returns true if `email`'s domain is the allowed domain.
    ///
    /// Subdomains and look-alike suffixes (`evilmesika.org`) do not match.
    #[must_use]
    pub fn is_allowed_email(&self, email: &str) -> bool {
        let email = normalize_email(email);
        match email.rsplit_once('@') {
            Some((local, domain)) => !local.is_empty() && domain == self.allowed_domain,
            None => false,
        }
    }

    /// Checks verification first, then the domain.
    pub fn authorize(&self, profile: &ProviderProfile) -> Result<(), AuthFlowError> {
        if !profile.email_verified {
            return Err(AuthFlowError::UnverifiedEmail {
                email: profile.email.clone(),
            });
        }
        if !self.is_allowed_email(&profile.email) {
            return Err(AuthFlowError::InvalidDomain {
                email: profile.email.clone(),
            });
        }
        Ok(())
    }
}

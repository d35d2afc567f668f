//! User record and related structures.
//!
//! A user is identified by their verified email address. The internal `id`
//! and `created_at` are assigned once, on the first successful login, and are
//! never changed by later logins.

use chrono::{DateTime, Utc};
use mesika_sso_core::UserId;
use serde::{Deserialize, Serialize};

use crate::provider::ProviderProfile;

/// Role given to every user created through single sign-on.
pub const DEFAULT_ROLE: &str = "user";

/// Normalizes an email address for storage and comparison.
///
/// Addresses differing only by case or surrounding whitespace map to the
/// same record.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A locally persisted user of the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Internal user ID.
    id: UserId,
    /// Normalized email address; the natural key for reconciliation.
    email: String,
    /// Display name from the provider profile.
    display_name: String,
    /// Provider-stable subject identifier.
    provider_subject_id: String,
    /// Application role.
    role: String,
    /// When the user last completed a login.
    last_login_at: DateTime<Utc>,
    /// When the user record was created.
    created_at: DateTime<Utc>,
    /// When the user record was last updated.
    updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a candidate record for a login happening now.
    ///
    /// The generated `id` is only kept if no record exists for the email yet.
    #[must_use]
    pub fn new(email: &str, display_name: String, provider_subject_id: String) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            email: normalize_email(email),
            display_name,
            provider_subject_id,
            role: DEFAULT_ROLE.to_string(),
            last_login_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builds the login candidate for an authorized provider profile.
    #[must_use]
    pub fn from_profile(profile: &ProviderProfile) -> Self {
        Self::new(
            &profile.email,
            profile.display_name.clone(),
            profile.subject_id.clone(),
        )
    }

    /// Creates a user with all fields specified.
    ///
    /// Use this when reconstituting a user from storage.
    #[must_use]
    #[expect(clippy::too_many_arguments)]
    pub fn with_all_fields(
        id: UserId,
        email: String,
        display_name: String,
        provider_subject_id: String,
        role: String,
        last_login_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            display_name,
            provider_subject_id,
            role,
            last_login_at,
            created_at,
            updated_at,
        }
    }

    /// Returns the user's internal ID.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Returns the normalized email address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the provider subject identifier.
    #[must_use]
    pub fn provider_subject_id(&self) -> &str {
        &self.provider_subject_id
    }

    /// Returns the application role.
    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Returns when the user last logged in.
    #[must_use]
    pub fn last_login_at(&self) -> DateTime<Utc> {
        self.last_login_at
    }

    /// Returns when the user was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the user was last updated.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Applies a login candidate to this existing record.
    ///
    /// `id`, `email` and `created_at` are kept; everything the provider
    /// reports is overwritten.
    pub fn apply_login(&mut self, candidate: &User) {
        self.display_name = candidate.display_name.clone();
        self.provider_subject_id = candidate.provider_subject_id.clone();
        self.role = candidate.role.clone();
        self.last_login_at = candidate.last_login_at;
        self.updated_at = candidate.updated_at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_is_normalized_with_default_role() {
        let user = User::new(
            "  Alice@Mesika.ORG ",
            "Alice".to_string(),
            "sub-1".to_string(),
        );

        assert_eq!(user.email(), "alice@mesika.org");
        assert_eq!(user.role(), DEFAULT_ROLE);
        assert!(user.id().to_string().starts_with("usr_"));
        assert_eq!(user.created_at(), user.updated_at());
        assert_eq!(user.created_at(), user.last_login_at());
    }

    #[test]
    fn apply_login_preserves_identity() {
        let created = Utc::now() - chrono::Duration::days(30);
        let mut existing = User::with_all_fields(
            UserId::new(),
            "alice@mesika.org".to_string(),
            "Old Name".to_string(),
            "old-sub".to_string(),
            "admin".to_string(),
            created,
            created,
            created,
        );
        let original_id = existing.id();

        let candidate = User::new("alice@mesika.org", "Alice".to_string(), "sub-2".to_string());
        existing.apply_login(&candidate);

        assert_eq!(existing.id(), original_id);
        assert_eq!(existing.created_at(), created);
        assert_eq!(existing.display_name(), "Alice");
        assert_eq!(existing.provider_subject_id(), "sub-2");
        assert_eq!(existing.role(), DEFAULT_ROLE);
        assert_eq!(existing.last_login_at(), candidate.last_login_at());
        assert!(existing.updated_at() > created);
    }

    #[test]
    fn from_profile_copies_claims() {
        let profile = ProviderProfile {
            subject_id: "1234".to_string(),
            email: "Bob@mesika.org".to_string(),
            email_verified: true,
            display_name: "Bob".to_string(),
            hosted_domain: Some("mesika.org".to_string()),
        };

        let user = User::from_profile(&profile);
        assert_eq!(user.email(), "bob@mesika.org");
        assert_eq!(user.display_name(), "Bob");
        assert_eq!(user.provider_subject_id(), "1234");
    }
}

//! Single sign-on login flow for the mesika gateway.
//!
//! This crate provides:
//! - The login state machine ([`AuthFlow`]) and its stages
//! - The identity provider seam ([`IdentityProvider`]) and its configuration
//! - Domain access policy ([`AccessPolicy`])
//! - User and session models with their store traits and in-memory stores
//! - The tagged error kinds every rejected step ends in
//!
//! # Access Control Model
//!
//! A login succeeds only when the provider reports a verified email whose
//! domain equals the configured allowed domain. Every admitted user gets the
//! `user` role.
//!
//! # Example
//!
//! ```
//! use mesika_sso_platform_access::{AccessPolicy, ProviderProfile};
//!
//! let policy = AccessPolicy::new("mesika.org");
//! let profile = ProviderProfile {
//!     subject_id: "1234".to_string(),
//!     email: "alice@mesika.org".to_string(),
//!     email_verified: true,
//!     display_name: "Alice".to_string(),
//!     hosted_domain: Some("mesika.org".to_string()),
//! };
//!
//! assert!(policy.authorize(&profile).is_ok());
//! assert!(!policy.is_allowed_email("alice@gmail.com"));
//! ```

pub mod auth;
pub mod error;
pub mod flow;
pub mod oauth;
pub mod policy;
pub mod provider;
pub mod session;
pub mod state;
pub mod store;
pub mod user;

// Re-export main types at crate root
pub use auth::{CallbackData, FlowStage, LoginInitiation, LoginOutcome};
pub use error::{AuthFlowError, ProviderError, StoreError};
pub use flow::{AuthFlow, FlowSettings};
pub use oauth::OAuthConfig;
pub use policy::AccessPolicy;
pub use provider::{IdentityProvider, ProviderProfile, ProviderToken};
pub use session::{AuthSession, SessionId};
pub use store::{InMemorySessionStore, InMemoryUserStore, SessionStore, UserStore};
pub use user::{DEFAULT_ROLE, User};

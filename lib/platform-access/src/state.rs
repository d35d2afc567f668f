//! Random opaque tokens for CSRF state and session identifiers.
//!
//! Tokens carry 256 bits from the thread-local CSPRNG, encoded as unpadded
//! base64url so they can travel in query strings and cookies unescaped.
//! No deduplication is performed: collisions are negligible at this size.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;

/// Number of random bytes in every generated token.
pub const TOKEN_BYTES: usize = 32;

fn random_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generates a fresh single-use state value for an authorization request.
#[must_use]
pub fn generate_state() -> String {
    random_token()
}

/// Generates a fresh session identifier.
#[must_use]
pub fn generate_session_id() -> String {
    random_token()
}

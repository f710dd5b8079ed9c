//! Invite-code generation and token digests.

use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::api::INVITE_CODE_LEN;

/// Number of random characters in a session token.
pub const SESSION_TOKEN_LEN: usize = 48;

/// Generate a random alphanumeric invite code.
///
/// Codes are 12 characters drawn from `[A-Za-z0-9]`, matching the
/// uniqueness constraint on the invitations table; collisions are
/// handled by retrying the insert.
pub fn generate_invite_code() -> String {
    random_alphanumeric(INVITE_CODE_LEN)
}

/// Generate a random bearer token for a new session.
pub fn generate_session_token() -> String {
    random_alphanumeric(SESSION_TOKEN_LEN)
}

/// Calculate the SHA-256 digest of a bearer token.
///
/// Only digests are persisted; authenticating a request hashes the
/// presented token and looks the digest up.
///
/// # Returns
/// Hexadecimal string representation of the SHA-256 hash.
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}

fn random_alphanumeric(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

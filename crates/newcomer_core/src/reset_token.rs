//! crates/newcomer_core/src/reset_token.rs
//!
//! Password-reset tokens. The raw token goes to the user; only its SHA-256
//! digest is stored on the profile.

use crate::domain::User;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes in a raw token (40 hex characters).
pub const RESET_TOKEN_BYTES: usize = 20;

/// How long an issued token stays redeemable.
pub fn reset_token_ttl() -> Duration {
    Duration::minutes(10)
}

/// Hex-encoded SHA-256 digest of a raw token, as stored on the profile.
pub fn hash_reset_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

fn generate_raw_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl User {
    /// Issues a fresh reset token, replacing any outstanding one, and returns
    /// the raw value.
    pub fn create_password_reset_token(&mut self, now: DateTime<Utc>) -> String {
        let raw = generate_raw_token();
        self.password_reset_token = Some(hash_reset_token(&raw));
        self.token_expires = Some(now + reset_token_ttl());
        raw
    }

    pub fn clear_password_reset_token(&mut self) {
        self.password_reset_token = None;
        self.token_expires = None;
    }

    /// Whether `raw` redeems the outstanding token at `now`.
    pub fn reset_token_matches(&self, raw: &str, now: DateTime<Utc>) -> bool {
        match (&self.password_reset_token, self.token_expires) {
            (Some(digest), Some(expires)) => expires > now && *digest == hash_reset_token(raw),
            _ => false,
        }
    }
}

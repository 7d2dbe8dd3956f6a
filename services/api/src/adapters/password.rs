//! services/api/src/adapters/password.rs
//!
//! Argon2 implementation of the `PasswordHasher` port.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};
use newcomer_core::ports::{PasswordHasher, PortError, PortResult};
use tracing::error;

/// Hashes passwords with Argon2id and a random salt per hash. The PHC string
/// carries the salt and parameters, so verification needs nothing else.
#[derive(Default, Clone)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plain: &str) -> PortResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!("Failed to hash password: {:?}", e);
                PortError::Unexpected("Failed to hash password".to_string())
            })?;
        Ok(hash.to_string())
    }

    fn verify(&self, candidate: &str, hash: &str) -> PortResult<bool> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            error!("Failed to parse password hash: {:?}", e);
            PortError::Unexpected("Stored password hash is malformed".to_string())
        })?;
        Ok(self
            .argon2
            .verify_password(candidate.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

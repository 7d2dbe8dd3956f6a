//! crates/newcomer_core/src/lifecycle.rs
//!
//! The save pipeline every write goes through: normalise, validate, then the
//! three pre-save hooks (assign id, hash password, default display name).

use tracing::debug;
use uuid::Uuid;

use crate::domain::{Password, Profile, User};
use crate::ports::{PasswordHasher, PortResult};

/// Prepares `user` for persistence. On error the user may be partially
/// normalised but is never persisted half-hashed.
pub fn prepare_for_save(user: &mut User, hasher: &dyn PasswordHasher) -> PortResult<()> {
    user.normalize();
    user.validate()?;

    assign_user_id(user);
    hash_password_if_plain(user, hasher)?;
    default_profile_name(user);
    Ok(())
}

fn assign_user_id(user: &mut User) {
    if user.user_id.is_none() {
        let id = Uuid::new_v4();
        debug!(user_id = %id, "Assigned new user id");
        user.user_id = Some(id);
    }
}

fn hash_password_if_plain(user: &mut User, hasher: &dyn PasswordHasher) -> PortResult<()> {
    if let Password::Plain(plain) = &user.personal_info.password {
        let hash = hasher.hash(plain)?;
        user.personal_info.password = Password::Hashed(hash);
    }
    Ok(())
}

fn default_profile_name(user: &mut User) {
    let profile = user.profile.get_or_insert_with(Profile::default);
    if profile.name.as_deref().map_or(true, str::is_empty) {
        profile.name = Some(user.personal_info.first_name.clone());
    }
}

impl User {
    /// Whether `candidate` matches the stored password hash. A password that
    /// has not been saved yet never matches.
    pub fn correct_password(
        &self,
        candidate: &str,
        hasher: &dyn PasswordHasher,
    ) -> PortResult<bool> {
        match self.personal_info.password.hash() {
            Some(hash) => hasher.verify(candidate, hash),
            None => Ok(false),
        }
    }
}

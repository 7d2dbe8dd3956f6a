//! crates/newcomer_core/src/service.rs
//!
//! `ProfileService` owns every write to a profile so that the save pipeline
//! in `lifecycle` runs exactly once per persisted change.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{ChatHistoryId, Password, ProfileUpdate, SearchHistoryEntry, User};
use crate::lifecycle::prepare_for_save;
use crate::ports::{DatabaseService, PasswordHasher, PortError, PortResult};
use crate::reset_token::hash_reset_token;

/// A raw reset token together with its expiry, as handed to the user.
#[derive(Debug, Clone)]
pub struct IssuedResetToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ProfileService {
    db: Arc<dyn DatabaseService>,
    hasher: Arc<dyn PasswordHasher>,
}

impl ProfileService {
    pub fn new(db: Arc<dyn DatabaseService>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { db, hasher }
    }

    async fn save_new(&self, mut user: User) -> PortResult<User> {
        prepare_for_save(&mut user, self.hasher.as_ref())?;
        self.db.insert_user(&user).await?;
        Ok(user)
    }

    async fn save_existing(&self, mut user: User) -> PortResult<User> {
        prepare_for_save(&mut user, self.hasher.as_ref())?;
        self.db.update_user(&user).await?;
        user.version += 1;
        Ok(user)
    }

    /// Creates a new profile. The caller supplies a plain password.
    pub async fn register(&self, user: User) -> PortResult<User> {
        let user = self.save_new(user).await?;
        info!(user_id = ?user.user_id, "Registered new user");
        Ok(user)
    }

    /// Looks a user up by e-mail and checks the password. Unknown e-mails
    /// and wrong passwords are indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> PortResult<User> {
        let user = match self.db.get_user_by_email(&email.to_lowercase()).await {
            Ok(user) => user,
            Err(PortError::NotFound(_)) => return Err(PortError::Unauthorized),
            Err(e) => return Err(e),
        };
        if user.correct_password(password, self.hasher.as_ref())? {
            Ok(user)
        } else {
            warn!(user_id = ?user.user_id, "Rejected login with wrong password");
            Err(PortError::Unauthorized)
        }
    }

    pub async fn get(&self, user_id: Uuid) -> PortResult<User> {
        self.db.get_user_by_id(user_id).await
    }

    pub async fn update(&self, user_id: Uuid, update: ProfileUpdate) -> PortResult<User> {
        let mut user = self.db.get_user_by_id(user_id).await?;
        update.apply_to(&mut user);
        self.save_existing(user).await
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> PortResult<()> {
        let mut user = self.db.get_user_by_id(user_id).await?;
        if !user.correct_password(current_password, self.hasher.as_ref())? {
            return Err(PortError::Unauthorized);
        }
        user.personal_info.password = Password::plain(new_password);
        self.save_existing(user).await?;
        info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Issues a reset token for the account behind `email`.
    pub async fn request_password_reset(&self, email: &str) -> PortResult<IssuedResetToken> {
        let mut user = self.db.get_user_by_email(&email.to_lowercase()).await?;
        let token = user.create_password_reset_token(Utc::now());
        let expires_at = user
            .token_expires
            .ok_or_else(|| PortError::Unexpected("reset token without expiry".to_string()))?;
        let user = self.save_existing(user).await?;
        info!(user_id = ?user.user_id, "Issued password reset token");
        Ok(IssuedResetToken { token, expires_at })
    }

    /// Redeems a reset token. The token is cleared on success, so it cannot
    /// be used twice.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> PortResult<()> {
        let now = Utc::now();
        let mut user = match self
            .db
            .get_user_by_reset_token(&hash_reset_token(token), now)
            .await
        {
            Ok(user) => user,
            Err(PortError::NotFound(_)) => return Err(PortError::Unauthorized),
            Err(e) => return Err(e),
        };
        if !user.reset_token_matches(token, now) {
            return Err(PortError::Unauthorized);
        }
        user.personal_info.password = Password::plain(new_password);
        user.clear_password_reset_token();
        let user = self.save_existing(user).await?;
        info!(user_id = ?user.user_id, "Password reset");
        Ok(())
    }

    pub async fn record_search(
        &self,
        user_id: Uuid,
        search_query: Option<String>,
    ) -> PortResult<SearchHistoryEntry> {
        let entry = SearchHistoryEntry::new(search_query);
        self.db.append_search_history(user_id, &entry).await?;
        Ok(entry)
    }

    /// Links a chat-history record to the profile and returns the linked
    /// records. Linking the same record twice is a no-op.
    pub async fn link_chat_history(
        &self,
        user_id: Uuid,
        chat_id: ChatHistoryId,
    ) -> PortResult<Vec<ChatHistoryId>> {
        self.db.link_chat_history(user_id, chat_id).await
    }

    pub async fn delete(&self, user_id: Uuid) -> PortResult<()> {
        self.db.delete_user(user_id).await?;
        info!(user_id = %user_id, "Deleted user");
        Ok(())
    }
}

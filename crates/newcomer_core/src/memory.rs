//! crates/newcomer_core/src/memory.rs
//!
//! An in-process `DatabaseService`, used by tests and local runs without
//! PostgreSQL. Enforces the same uniqueness rules as the SQL schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{AuthSession, ChatHistoryId, SearchHistoryEntry, User};
use crate::ports::{DatabaseService, PortError, PortResult};

#[derive(Default)]
pub struct InMemoryDatabase {
    users: RwLock<HashMap<Uuid, User>>,
    sessions: RwLock<HashMap<String, AuthSession>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

fn require_id(user: &User) -> PortResult<Uuid> {
    user.user_id
        .ok_or_else(|| PortError::Unexpected("user has no id assigned".to_string()))
}

fn email_taken(users: &HashMap<Uuid, User>, email: &str, except: Uuid) -> bool {
    users
        .values()
        .any(|u| u.user_id != Some(except) && u.email() == email)
}

#[async_trait]
impl DatabaseService for InMemoryDatabase {
    async fn insert_user(&self, user: &User) -> PortResult<()> {
        let id = require_id(user)?;
        let mut users = self.users.write().await;
        if users.contains_key(&id) {
            return Err(PortError::Conflict(format!("User {} already exists", id)));
        }
        if email_taken(&users, user.email(), id) {
            return Err(PortError::Conflict(format!(
                "E-mail {} is already registered",
                user.email()
            )));
        }
        users.insert(id, user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> PortResult<()> {
        let id = require_id(user)?;
        let mut users = self.users.write().await;
        let stored_version = users
            .get(&id)
            .map(|stored| stored.version)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", id)))?;
        if stored_version != user.version {
            return Err(PortError::Conflict(format!(
                "User {} was modified concurrently",
                id
            )));
        }
        if email_taken(&users, user.email(), id) {
            return Err(PortError::Conflict(format!(
                "E-mail {} is already registered",
                user.email()
            )));
        }
        let mut stored = user.clone();
        stored.version += 1;
        users.insert(id, stored);
        Ok(())
    }

    async fn append_search_history(
        &self,
        user_id: Uuid,
        entry: &SearchHistoryEntry,
    ) -> PortResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        user.search_history.push(entry.clone());
        user.version += 1;
        Ok(())
    }

    async fn link_chat_history(
        &self,
        user_id: Uuid,
        chat_id: ChatHistoryId,
    ) -> PortResult<Vec<ChatHistoryId>> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        if !user.chat_history.contains(&chat_id) {
            user.chat_history.push(chat_id);
            user.version += 1;
        }
        Ok(user.chat_history.clone())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        self.users
            .read()
            .await
            .get(&user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<User> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email() == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User with e-mail {} not found", email)))
    }

    async fn get_user_by_reset_token(&self, digest: &str, now: DateTime<Utc>) -> PortResult<User> {
        self.users
            .read()
            .await
            .values()
            .find(|u| {
                u.password_reset_token.as_deref() == Some(digest)
                    && u.token_expires.map_or(false, |expires| expires > now)
            })
            .cloned()
            .ok_or_else(|| PortError::NotFound("Reset token not found or expired".to_string()))
    }

    async fn delete_user(&self, user_id: Uuid) -> PortResult<()> {
        if self.users.write().await.remove(&user_id).is_none() {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        self.sessions
            .write()
            .await
            .retain(|_, session| session.user_id != user_id);
        Ok(())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        sessions.retain(|_, session| session.expires_at > now);
        sessions.insert(
            session_id.to_string(),
            AuthSession {
                id: session_id.to_string(),
                user_id,
                expires_at,
            },
        );
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        match self.sessions.read().await.get(session_id) {
            Some(session) if session.expires_at > Utc::now() => Ok(session.user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}

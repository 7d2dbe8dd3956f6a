//! crates/newcomer_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or hashers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{ChatHistoryId, SearchHistoryEntry, User};
use crate::validation::ValidationError;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, hasher).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    /// Stores a new user. `user_id` must already be assigned.
    /// Duplicate ids or e-mails are a `Conflict`.
    async fn insert_user(&self, user: &User) -> PortResult<()>;

    /// Overwrites a stored user, provided the stored `version` still equals
    /// `user.version`. The stored version is then `user.version + 1`.
    /// A missing user is `NotFound`; a version mismatch is `Conflict`.
    async fn update_user(&self, user: &User) -> PortResult<()>;

    /// Atomically appends one entry to the user's search history.
    async fn append_search_history(
        &self,
        user_id: Uuid,
        entry: &SearchHistoryEntry,
    ) -> PortResult<()>;

    /// Atomically links a chat-history record unless already linked, and
    /// returns the resulting list.
    async fn link_chat_history(
        &self,
        user_id: Uuid,
        chat_id: ChatHistoryId,
    ) -> PortResult<Vec<ChatHistoryId>>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<User>;

    /// Finds the user holding the given token digest, provided it has not
    /// expired at `now`.
    async fn get_user_by_reset_token(&self, digest: &str, now: DateTime<Utc>) -> PortResult<User>;

    /// Removes the user and any of their auth sessions.
    async fn delete_user(&self, user_id: Uuid) -> PortResult<()>;

    // --- Auth Methods ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the owning user of an unexpired session.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}

/// One-way password hashing.
pub trait PasswordHasher: Send + Sync {
    /// Hashes `plain` with a fresh salt into a self-describing hash string.
    fn hash(&self, plain: &str) -> PortResult<String>;

    /// Checks `candidate` against a hash produced by [`PasswordHasher::hash`].
    fn verify(&self, candidate: &str, hash: &str) -> PortResult<bool>;
}

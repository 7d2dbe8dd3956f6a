//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use newcomer_core::domain::{
    EducationAndEmployment, FamilyInfo, HousingSituation, ImmigrationInfo, LanguageProficiency,
    ChatHistoryId, PersonalInfo, Profile, SearchHistoryEntry, SocialIntegration, SupportNeeds, User,
};
use newcomer_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::error;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Tells a missing user apart from a version mismatch after an update
    /// matched no rows.
    async fn missing_or_stale(&self, user_id: Uuid) -> PortError {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE user_id = $1)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await;
        match exists {
            Ok(true) => PortError::Conflict(format!("User {} was modified concurrently", user_id)),
            Ok(false) => PortError::NotFound(format!("User {} not found", user_id)),
            Err(e) => PortError::Unexpected(e.to_string()),
        }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const USER_COLUMNS: &str = "user_id, personal_info, immigration_info, language_proficiency, \
     education_and_employment, housing_situation, family_info, social_integration, \
     support_needs, profile, search_history, chat_history, profile_picture, \
     password_reset_token, token_expires, version";

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    personal_info: Json<PersonalInfo>,
    immigration_info: Option<Json<ImmigrationInfo>>,
    language_proficiency: Option<Json<LanguageProficiency>>,
    education_and_employment: Option<Json<EducationAndEmployment>>,
    housing_situation: Option<Json<HousingSituation>>,
    family_info: Option<Json<FamilyInfo>>,
    social_integration: Option<Json<SocialIntegration>>,
    support_needs: Option<Json<SupportNeeds>>,
    profile: Option<Json<Profile>>,
    search_history: Json<Vec<SearchHistoryEntry>>,
    chat_history: Vec<Uuid>,
    profile_picture: Option<String>,
    password_reset_token: Option<String>,
    token_expires: Option<DateTime<Utc>>,
    version: i64,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: Some(self.user_id),
            personal_info: self.personal_info.0,
            immigration_info: self.immigration_info.map(|j| j.0),
            language_proficiency: self.language_proficiency.map(|j| j.0),
            education_and_employment: self.education_and_employment.map(|j| j.0),
            housing_situation: self.housing_situation.map(|j| j.0),
            family_info: self.family_info.map(|j| j.0),
            social_integration: self.social_integration.map(|j| j.0),
            support_needs: self.support_needs.map(|j| j.0),
            profile: self.profile.map(|j| j.0),
            search_history: self.search_history.0,
            chat_history: self.chat_history,
            profile_picture: self.profile_picture,
            password_reset_token: self.password_reset_token,
            token_expires: self.token_expires,
            version: self.version,
        }
    }
}

fn require_id(user: &User) -> PortResult<Uuid> {
    user.user_id
        .ok_or_else(|| PortError::Unexpected("user has no id assigned".to_string()))
}

/// Maps a write failure, turning unique-index violations into `Conflict`.
fn write_error(e: sqlx::Error) -> PortError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PortError::Conflict("A user with this id or e-mail already exists".to_string())
        }
        _ => {
            error!("Database write failed: {:?}", e);
            PortError::Unexpected(e.to_string())
        }
    }
}

fn read_error(e: sqlx::Error, what: impl FnOnce() -> String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what()),
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn insert_user(&self, user: &User) -> PortResult<()> {
        let user_id = require_id(user)?;
        sqlx::query(
            "INSERT INTO users (user_id, email, personal_info, immigration_info, \
             language_proficiency, education_and_employment, housing_situation, family_info, \
             social_integration, support_needs, profile, search_history, chat_history, \
             profile_picture, password_reset_token, token_expires, version) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(user_id)
        .bind(user.email())
        .bind(Json(&user.personal_info))
        .bind(user.immigration_info.as_ref().map(Json))
        .bind(user.language_proficiency.as_ref().map(Json))
        .bind(user.education_and_employment.as_ref().map(Json))
        .bind(user.housing_situation.as_ref().map(Json))
        .bind(user.family_info.as_ref().map(Json))
        .bind(user.social_integration.as_ref().map(Json))
        .bind(user.support_needs.as_ref().map(Json))
        .bind(user.profile.as_ref().map(Json))
        .bind(Json(&user.search_history))
        .bind(&user.chat_history)
        .bind(&user.profile_picture)
        .bind(&user.password_reset_token)
        .bind(user.token_expires)
        .bind(user.version)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(())
    }

    async fn update_user(&self, user: &User) -> PortResult<()> {
        let user_id = require_id(user)?;
        let result = sqlx::query(
            "UPDATE users SET email = $2, personal_info = $3, immigration_info = $4, \
             language_proficiency = $5, education_and_employment = $6, housing_situation = $7, \
             family_info = $8, social_integration = $9, support_needs = $10, profile = $11, \
             search_history = $12, chat_history = $13, profile_picture = $14, \
             password_reset_token = $15, token_expires = $16, version = version + 1, \
             updated_at = now() \
             WHERE user_id = $1 AND version = $17",
        )
        .bind(user_id)
        .bind(user.email())
        .bind(Json(&user.personal_info))
        .bind(user.immigration_info.as_ref().map(Json))
        .bind(user.language_proficiency.as_ref().map(Json))
        .bind(user.education_and_employment.as_ref().map(Json))
        .bind(user.housing_situation.as_ref().map(Json))
        .bind(user.family_info.as_ref().map(Json))
        .bind(user.social_integration.as_ref().map(Json))
        .bind(user.support_needs.as_ref().map(Json))
        .bind(user.profile.as_ref().map(Json))
        .bind(Json(&user.search_history))
        .bind(&user.chat_history)
        .bind(&user.profile_picture)
        .bind(&user.password_reset_token)
        .bind(user.token_expires)
        .bind(user.version)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        if result.rows_affected() == 0 {
            return Err(self.missing_or_stale(user_id).await);
        }
        Ok(())
    }

    async fn append_search_history(
        &self,
        user_id: Uuid,
        entry: &SearchHistoryEntry,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE users SET search_history = search_history || jsonb_build_array($2::jsonb), \
             version = version + 1, updated_at = now() \
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(Json(entry))
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    async fn link_chat_history(
        &self,
        user_id: Uuid,
        chat_id: ChatHistoryId,
    ) -> PortResult<Vec<ChatHistoryId>> {
        let linked: Option<Vec<Uuid>> = sqlx::query_scalar(
            "UPDATE users SET chat_history = array_append(chat_history, $2), \
             version = version + 1, updated_at = now() \
             WHERE user_id = $1 AND NOT ($2 = ANY(chat_history)) \
             RETURNING chat_history",
        )
        .bind(user_id)
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(write_error)?;

        match linked {
            Some(chat_history) => Ok(chat_history),
            // Already linked, or no such user.
            None => sqlx::query_scalar("SELECT chat_history FROM users WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| read_error(e, || format!("User {} not found", user_id))),
        }
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| read_error(e, || format!("User {} not found", user_id)))?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| read_error(e, || format!("User with e-mail {} not found", email)))?;
        Ok(record.to_domain())
    }

    async fn get_user_by_reset_token(&self, digest: &str, now: DateTime<Utc>) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE password_reset_token = $1 AND token_expires > $2"
        ))
        .bind(digest)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| read_error(e, || "Reset token not found or expired".to_string()))?;
        Ok(record.to_domain())
    }

    async fn delete_user(&self, user_id: Uuid) -> PortResult<()> {
        // auth_sessions rows go with the user via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(write_error)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        user_id.ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}

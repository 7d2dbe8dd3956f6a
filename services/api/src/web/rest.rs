//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the profile endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::auth::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, ResetTokenResponse,
    SignupPersonalInfo, SignupRequest,
};
use crate::web::response::{error_response, port_error, ErrorResponse, HandlerError};
use crate::web::state::AppState;
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, NaiveDate, Utc};
use newcomer_core::domain::{
    EducationAndEmployment, FamilyInfo, HousingSituation, ImmigrationInfo, LanguageProficiency,
    Profile, ProfileUpdate, SearchHistoryEntry, SocialIntegration, SupportNeeds, User,
};
use newcomer_core::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        crate::web::auth::forgot_password_handler,
        crate::web::auth::reset_password_handler,
        get_profile_handler,
        update_profile_handler,
        delete_profile_handler,
        change_password_handler,
        list_search_history_handler,
        record_search_handler,
        link_chat_history_handler,
    ),
    components(
        schemas(
            SignupRequest,
            SignupPersonalInfo,
            LoginRequest,
            AuthResponse,
            ForgotPasswordRequest,
            ResetTokenResponse,
            ResetPasswordRequest,
            UserResponse,
            PublicPersonalInfo,
            UpdateProfileRequest,
            ChangePasswordRequest,
            SearchRequest,
            SearchEntryResponse,
            LinkChatRequest,
            ChatHistoryResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Newcomer Profile API", description = "Profiles, credentials and history for newcomers settling in.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// Personal details as returned to the owner. Never carries the password.
#[derive(Serialize, ToSchema)]
pub struct PublicPersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
}

/// A full profile without credentials or reset-token state.
#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub personal_info: PublicPersonalInfo,
    #[schema(value_type = Option<Object>)]
    pub immigration_info: Option<ImmigrationInfo>,
    #[schema(value_type = Option<Object>)]
    pub language_proficiency: Option<LanguageProficiency>,
    #[schema(value_type = Option<Object>)]
    pub education_and_employment: Option<EducationAndEmployment>,
    #[schema(value_type = Option<Object>)]
    pub housing_situation: Option<HousingSituation>,
    #[schema(value_type = Option<Object>)]
    pub family_info: Option<FamilyInfo>,
    #[schema(value_type = Option<Object>)]
    pub social_integration: Option<SocialIntegration>,
    #[schema(value_type = Option<Object>)]
    pub support_needs: Option<SupportNeeds>,
    #[schema(value_type = Option<Object>)]
    pub profile: Option<Profile>,
    pub search_history: Vec<SearchEntryResponse>,
    pub chat_history: Vec<Uuid>,
    pub profile_picture: Option<String>,
}

impl UserResponse {
    fn from_user(user: User) -> Result<Self, HandlerError> {
        let user_id = user.user_id.ok_or_else(|| {
            error!("Stored user has no id");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load profile")
        })?;
        let personal = user.personal_info;
        Ok(Self {
            user_id,
            personal_info: PublicPersonalInfo {
                first_name: personal.first_name,
                last_name: personal.last_name,
                date_of_birth: personal.date_of_birth,
                email: personal.email,
                phone: personal.phone,
                address: personal.address,
            },
            immigration_info: user.immigration_info,
            language_proficiency: user.language_proficiency,
            education_and_employment: user.education_and_employment,
            housing_situation: user.housing_situation,
            family_info: user.family_info,
            social_integration: user.social_integration,
            support_needs: user.support_needs,
            profile: user.profile,
            search_history: user
                .search_history
                .into_iter()
                .map(SearchEntryResponse::from)
                .collect(),
            chat_history: user.chat_history,
            profile_picture: user.profile_picture,
        })
    }
}

/// Partial profile update. Each present section replaces the stored one.
#[derive(Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub immigration_info: Option<ImmigrationInfo>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub language_proficiency: Option<LanguageProficiency>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub education_and_employment: Option<EducationAndEmployment>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub housing_situation: Option<HousingSituation>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub family_info: Option<FamilyInfo>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub social_integration: Option<SocialIntegration>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub support_needs: Option<SupportNeeds>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub profile: Option<Profile>,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(req: UpdateProfileRequest) -> Self {
        ProfileUpdate {
            first_name: req.first_name,
            last_name: req.last_name,
            date_of_birth: req.date_of_birth,
            email: req.email,
            phone: req.phone,
            address: req.address,
            immigration_info: req.immigration_info,
            language_proficiency: req.language_proficiency,
            education_and_employment: req.education_and_employment,
            housing_situation: req.housing_situation,
            family_info: req.family_info,
            social_integration: req.social_integration,
            support_needs: req.support_needs,
            profile: req.profile,
            profile_picture: req.profile_picture,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SearchRequest {
    #[serde(default)]
    pub search_query: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SearchEntryResponse {
    pub search_query: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<SearchHistoryEntry> for SearchEntryResponse {
    fn from(entry: SearchHistoryEntry) -> Self {
        Self {
            search_query: entry.search_query,
            timestamp: entry.timestamp,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct LinkChatRequest {
    pub chat_id: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct ChatHistoryResponse {
    pub chat_history: Vec<Uuid>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Fetch the authenticated user's profile.
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "The profile", body = UserResponse),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "Profile no longer exists", body = ErrorResponse)
    )
)]
pub async fn get_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let user = state
        .profiles
        .get(user_id)
        .await
        .map_err(|e| port_error(e, "Failed to load profile"))?;
    Ok(Json(UserResponse::from_user(user)?))
}

/// Update sections of the authenticated user's profile.
#[utoipa::path(
    patch,
    path = "/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "The updated profile", body = UserResponse),
        (status = 400, description = "Invalid profile", body = ErrorResponse),
        (status = 409, description = "E-mail already registered", body = ErrorResponse)
    )
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let user = state
        .profiles
        .update(user_id, req.into())
        .await
        .map_err(|e| port_error(e, "Failed to update profile"))?;
    Ok(Json(UserResponse::from_user(user)?))
}

/// Delete the authenticated user's profile and all of their sessions.
#[utoipa::path(
    delete,
    path = "/users/me",
    responses(
        (status = 204, description = "Profile deleted"),
        (status = 404, description = "Profile no longer exists", body = ErrorResponse)
    )
)]
pub async fn delete_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    state
        .profiles
        .delete(user_id)
        .await
        .map_err(|e| port_error(e, "Failed to delete profile"))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Change the password, given the current one.
#[utoipa::path(
    put,
    path = "/users/me/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "New password is empty", body = ErrorResponse),
        (status = 401, description = "Current password is wrong", body = ErrorResponse)
    )
)]
pub async fn change_password_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    state
        .profiles
        .change_password(user_id, &req.current_password, &req.new_password)
        .await
        .map_err(|e| match e {
            PortError::Unauthorized => {
                error_response(StatusCode::UNAUTHORIZED, "Current password is incorrect")
            }
            other => port_error(other, "Failed to change password"),
        })?;
    Ok(StatusCode::NO_CONTENT)
}

/// List the user's past searches, oldest first.
#[utoipa::path(
    get,
    path = "/users/me/search-history",
    responses(
        (status = 200, description = "Search history", body = [SearchEntryResponse])
    )
)]
pub async fn list_search_history_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let user = state
        .profiles
        .get(user_id)
        .await
        .map_err(|e| port_error(e, "Failed to load search history"))?;
    let entries: Vec<SearchEntryResponse> = user
        .search_history
        .into_iter()
        .map(SearchEntryResponse::from)
        .collect();
    Ok(Json(entries))
}

/// Append a search to the user's history.
#[utoipa::path(
    post,
    path = "/users/me/search-history",
    request_body = SearchRequest,
    responses(
        (status = 201, description = "Search recorded", body = SearchEntryResponse)
    )
)]
pub async fn record_search_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<SearchRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let entry = state
        .profiles
        .record_search(user_id, req.search_query)
        .await
        .map_err(|e| port_error(e, "Failed to record search"))?;
    Ok((StatusCode::CREATED, Json(SearchEntryResponse::from(entry))))
}

/// Link a chat-history record to the user's profile.
#[utoipa::path(
    post,
    path = "/users/me/chat-history",
    request_body = LinkChatRequest,
    responses(
        (status = 200, description = "Linked chat histories", body = ChatHistoryResponse)
    )
)]
pub async fn link_chat_history_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<LinkChatRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let chat_history = state
        .profiles
        .link_chat_history(user_id, req.chat_id)
        .await
        .map_err(|e| port_error(e, "Failed to link chat history"))?;
    Ok(Json(ChatHistoryResponse { chat_history }))
}

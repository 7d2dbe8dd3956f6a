//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for signup, login, logout and password reset.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use newcomer_core::domain::{
    EducationAndEmployment, FamilyInfo, HousingSituation, ImmigrationInfo, LanguageProficiency,
    Password, PersonalInfo, Profile, SocialIntegration, SupportNeeds, User,
};
use newcomer_core::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::response::{error_response, port_error, ErrorResponse, HandlerError};
use crate::web::state::AppState;

pub const SESSION_COOKIE: &str = "session";

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// Personal details supplied at signup. Missing strings are reported by
/// validation rather than rejected by the JSON parser.
#[derive(Deserialize, ToSchema)]
pub struct SignupPersonalInfo {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub personal_info: SignupPersonalInfo,
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

impl SignupRequest {
    fn into_user(self) -> User {
        let personal = self.personal_info;
        let mut user = User::new(PersonalInfo {
            first_name: personal.first_name,
            last_name: personal.last_name,
            date_of_birth: personal.date_of_birth,
            email: personal.email,
            password: Password::plain(personal.password),
            phone: personal.phone,
            address: personal.address,
        });
        user.immigration_info = self.immigration_info;
        user.language_proficiency = self.language_proficiency;
        user.education_and_employment = self.education_and_employment;
        user.housing_situation = self.housing_situation;
        user.family_info = self.family_info;
        user.social_integration = self.social_integration;
        user.support_needs = self.support_needs;
        user.profile = self.profile;
        user.profile_picture = self.profile_picture;
        user
    }
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Serialize, ToSchema)]
pub struct ResetTokenResponse {
    pub reset_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

//=========================================================================================
// Session Helpers
//=========================================================================================

/// Creates an auth session for `user_id` and returns the `Set-Cookie` value.
async fn start_auth_session(state: &AppState, user_id: Uuid) -> Result<String, HandlerError> {
    let auth_session_id = Uuid::new_v4().to_string();
    let lifetime = Duration::days(state.config.auth_session_days);
    let expires_at = Utc::now() + lifetime;

    state
        .db
        .create_auth_session(&auth_session_id, user_id, expires_at)
        .await
        .map_err(|e| {
            error!("Failed to create auth session: {:?}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session")
        })?;

    Ok(format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        auth_session_id,
        lifetime.num_seconds()
    ))
}

/// Extracts the auth session id from the `Cookie` header.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))
}

fn user_id_of(user: &User) -> Result<Uuid, HandlerError> {
    user.user_id.ok_or_else(|| {
        error!("Saved user has no id");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user")
    })
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new newcomer profile
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid profile", body = ErrorResponse),
        (status = 409, description = "E-mail already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let user = state
        .profiles
        .register(req.into_user())
        .await
        .map_err(|e| port_error(e, "Failed to create user"))?;
    let user_id = user_id_of(&user)?;

    let cookie = start_auth_session(&state, user_id).await?;

    let response = AuthResponse {
        user_id,
        email: user.personal_info.email,
    };

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(response),
    ))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let user = state
        .profiles
        .authenticate(&req.email, &req.password)
        .await
        .map_err(|e| match e {
            PortError::Unauthorized => {
                error_response(StatusCode::UNAUTHORIZED, "Invalid email or password")
            }
            other => port_error(other, "Authentication error"),
        })?;
    let user_id = user_id_of(&user)?;

    let cookie = start_auth_session(&state, user_id).await?;
    info!(user_id = %user_id, "User logged in");

    let response = AuthResponse {
        user_id,
        email: user.personal_info.email,
    };

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(response)))
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session", body = ErrorResponse)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HandlerError> {
    let auth_session_id = session_id_from_headers(&headers)
        .ok_or_else(|| error_response(StatusCode::UNAUTHORIZED, "No session found"))?;

    state
        .db
        .delete_auth_session(auth_session_id)
        .await
        .map_err(|e| port_error(e, "Failed to logout"))?;

    let cookie = format!(
        "{}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE
    );

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)]))
}

/// POST /auth/forgot-password - Issue a password reset token
///
/// The raw token is returned to the caller; it is valid for ten minutes.
#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset token issued", body = ResetTokenResponse),
        (status = 404, description = "No account for this e-mail", body = ErrorResponse)
    )
)]
pub async fn forgot_password_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let issued = state
        .profiles
        .request_password_reset(&req.email)
        .await
        .map_err(|e| port_error(e, "Failed to issue reset token"))?;

    Ok(Json(ResetTokenResponse {
        reset_token: issued.token,
        expires_at: issued.expires_at,
    }))
}

/// POST /auth/reset-password - Redeem a reset token
#[utoipa::path(
    post,
    path = "/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 204, description = "Password updated"),
        (status = 400, description = "Invalid or expired token", body = ErrorResponse)
    )
)]
pub async fn reset_password_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    state
        .profiles
        .reset_password(&req.token, &req.new_password)
        .await
        .map_err(|e| match e {
            PortError::Unauthorized => {
                error_response(StatusCode::BAD_REQUEST, "Token is invalid or has expired")
            }
            other => port_error(other, "Failed to reset password"),
        })?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn finds_session_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=abc-123; lang=fr"),
        );
        assert_eq!(session_id_from_headers(&headers), Some("abc-123"));
    }

    #[test]
    fn missing_cookie_header_yields_none() {
        assert_eq!(session_id_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn signup_without_birth_date_reports_every_missing_field() {
        let req: SignupRequest = serde_json::from_str(
            r#"{"personal_info":{"first_name":"Li","last_name":"Wei","email":"",
                "password":"pw","phone":"555"}}"#,
        )
        .unwrap();
        let err = req.into_user().validate().unwrap_err();
        assert_eq!(
            err.paths(),
            vec!["personal_info.date_of_birth", "personal_info.email"]
        );
    }
}

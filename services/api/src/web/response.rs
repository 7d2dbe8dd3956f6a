//! services/api/src/web/response.rs
//!
//! Maps core port errors onto HTTP responses.

use axum::{http::StatusCode, Json};
use newcomer_core::ports::PortError;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

/// Body of every non-2xx response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Dotted paths of the fields that failed validation, if any.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

pub type HandlerError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(status: StatusCode, message: impl Into<String>) -> HandlerError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            fields: Vec::new(),
        }),
    )
}

/// Converts a port error into a response. `context` names the failed action
/// and is the only text a 500 ever exposes.
pub fn port_error(e: PortError, context: &str) -> HandlerError {
    match e {
        PortError::NotFound(msg) => error_response(StatusCode::NOT_FOUND, msg),
        PortError::Conflict(msg) => error_response(StatusCode::CONFLICT, msg),
        PortError::Invalid(validation) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: validation.to_string(),
                fields: validation.errors.into_iter().map(|f| f.path).collect(),
            }),
        ),
        PortError::Unauthorized => error_response(StatusCode::UNAUTHORIZED, "Unauthorized"),
        PortError::Unexpected(msg) => {
            error!("{}: {}", context, msg);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, context)
        }
    }
}

//! services/api/src/web/router.rs
//!
//! Assembles the API routes. Swagger UI and CORS are layered on by the
//! binary so tests can drive the bare router.

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::web::auth::{
    forgot_password_handler, login_handler, logout_handler, reset_password_handler,
    signup_handler,
};
use crate::web::middleware::require_auth;
use crate::web::rest::{
    change_password_handler, delete_profile_handler, get_profile_handler,
    link_chat_history_handler, list_search_history_handler, record_search_handler,
    update_profile_handler,
};
use crate::web::state::AppState;

/// Largest accepted request body; profiles are small JSON documents.
const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn build_router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/auth/forgot-password", post(forgot_password_handler))
        .route("/auth/reset-password", post(reset_password_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route(
            "/users/me",
            get(get_profile_handler)
                .patch(update_profile_handler)
                .delete(delete_profile_handler),
        )
        .route("/users/me/password", put(change_password_handler))
        .route(
            "/users/me/search-history",
            get(list_search_history_handler).post(record_search_handler),
        )
        .route("/users/me/chat-history", post(link_chat_history_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(app_state)
}

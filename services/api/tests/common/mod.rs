//! Shared helpers for the HTTP integration tests.
#![allow(dead_code)]

use api_lib::config::Config;
use api_lib::web::{build_router, AppState};
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use newcomer_core::ports::{PasswordHasher, PortResult};
use newcomer_core::{InMemoryDatabase, ProfileService};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use tracing::Level;

/// Reversible stand-in for Argon2 so the tests stay fast.
pub struct TestHasher;

impl PasswordHasher for TestHasher {
    fn hash(&self, plain: &str) -> PortResult<String> {
        Ok(format!("test-hash:{plain}"))
    }

    fn verify(&self, candidate: &str, hash: &str) -> PortResult<bool> {
        Ok(hash.strip_prefix("test-hash:") == Some(candidate))
    }
}

pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "memory".to_string(),
        db_max_connections: 1,
        log_level: Level::DEBUG,
        auth_session_days: 30,
        cors_origin: "http://localhost:3000".to_string(),
    }
}

pub fn create_test_app() -> Router {
    let db = Arc::new(InMemoryDatabase::new());
    let state = Arc::new(AppState {
        db: db.clone(),
        profiles: ProfileService::new(db, Arc::new(TestHasher)),
        config: Arc::new(test_config()),
    });
    build_router(state)
}

pub fn signup_payload(email: &str) -> Value {
    json!({
        "personal_info": {
            "first_name": "Yusuf",
            "last_name": "Haddad",
            "date_of_birth": "1988-11-02",
            "email": email,
            "password": "initial-pass",
            "phone": "+1 613 555 0142"
        },
        "immigration_info": {
            "country_of_origin": "Syria",
            "current_immigration_status": "permanent resident",
            "date_of_immigration": "2023-06-15",
            "visa_type": "refugee",
            "type_of_status": "protected person"
        },
        "family_info": {
            "num_of_family_members": 4,
            "relationship": "married"
        }
    })
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// The `name=value` part of the response's `Set-Cookie` header.
pub fn session_cookie(response: &Response<Body>) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("response sets a cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

/// Signs up a user and returns their session cookie.
pub async fn sign_up(app: &Router, email: &str) -> String {
    let response = send(app, "POST", "/auth/signup", None, Some(signup_payload(email))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    session_cookie(&response)
}

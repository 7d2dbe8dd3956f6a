//! Integration tests for the auth endpoints
mod common;

use crate::common::{create_test_app, json_body, send, session_cookie, sign_up, signup_payload};

use axum::http::{header, StatusCode};
use serde_json::json;

#[tokio::test]
async fn test_signup_creates_user_and_session() {
    let app = create_test_app();

    let response = send(
        &app,
        "POST",
        "/auth/signup",
        None,
        Some(signup_payload("Yusuf.Haddad@Example.com")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains(&format!("Max-Age={}", 30 * 24 * 60 * 60)));

    let json = json_body(response).await;
    assert_eq!(json["email"], "yusuf.haddad@example.com");
    assert!(json["user_id"].as_str().is_some());
}

#[tokio::test]
async fn test_signup_reports_missing_fields() {
    let app = create_test_app();
    let mut payload = signup_payload("someone@example.com");
    payload["personal_info"]["phone"] = json!("");
    payload["family_info"] = json!({ "num_of_family_members": 2 });

    let response = send(&app, "POST", "/auth/signup", None, Some(payload)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    let fields: Vec<&str> = json["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["personal_info.phone", "family_info.relationship"]);
}

#[tokio::test]
async fn test_signup_with_partial_section_lists_missing_fields() {
    let app = create_test_app();
    let mut payload = signup_payload("partial@example.com");
    payload["immigration_info"]
        .as_object_mut()
        .unwrap()
        .remove("visa_type");

    let response = send(&app, "POST", "/auth/signup", None, Some(payload)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["fields"], json!(["immigration_info.visa_type"]));
}

#[tokio::test]
async fn test_signup_without_birth_date_lists_every_missing_field() {
    let app = create_test_app();
    let mut payload = signup_payload("unused@example.com");
    let personal = payload["personal_info"].as_object_mut().unwrap();
    personal.remove("date_of_birth");
    personal.insert("email".to_string(), json!(""));

    let response = send(&app, "POST", "/auth/signup", None, Some(payload)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(
        json["fields"],
        json!(["personal_info.date_of_birth", "personal_info.email"])
    );
}

#[tokio::test]
async fn test_signup_duplicate_email_conflicts() {
    let app = create_test_app();
    sign_up(&app, "dup@example.com").await;

    let response = send(
        &app,
        "POST",
        "/auth/signup",
        None,
        Some(signup_payload("DUP@example.com")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_success_and_failure() {
    let app = create_test_app();
    sign_up(&app, "login@example.com").await;

    let ok = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "Login@Example.com", "password": "initial-pass" })),
    )
    .await;
    assert_eq!(ok.status(), StatusCode::OK);
    assert!(session_cookie(&ok).starts_with("session="));

    let wrong = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "login@example.com", "password": "guess" })),
    )
    .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let unknown = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "ghost@example.com", "password": "initial-pass" })),
    )
    .await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let app = create_test_app();
    let cookie = sign_up(&app, "logout@example.com").await;

    let response = send(&app, "POST", "/auth/logout", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/users/me", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = create_test_app();
    sign_up(&app, "reset@example.com").await;

    let response = send(
        &app,
        "POST",
        "/auth/forgot-password",
        None,
        Some(json!({ "email": "reset@example.com" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    let token = json["reset_token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 40);

    let response = send(
        &app,
        "POST",
        "/auth/reset-password",
        None,
        Some(json!({ "token": token, "new_password": "fresh-pass" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let reused = send(
        &app,
        "POST",
        "/auth/reset-password",
        None,
        Some(json!({ "token": token, "new_password": "other-pass" })),
    )
    .await;
    assert_eq!(reused.status(), StatusCode::BAD_REQUEST);

    let login = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "reset@example.com", "password": "fresh-pass" })),
    )
    .await;
    assert_eq!(login.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_forgot_password_unknown_email() {
    let app = create_test_app();

    let response = send(
        &app,
        "POST",
        "/auth/forgot-password",
        None,
        Some(json!({ "email": "nobody@example.com" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

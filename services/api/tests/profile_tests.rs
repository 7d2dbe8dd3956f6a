//! Integration tests for the profile endpoints
mod common;

use crate::common::{create_test_app, json_body, send, sign_up};

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_profile_requires_session() {
    let app = create_test_app();

    let missing = send(&app, "GET", "/users/me", None, None).await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let bogus = send(&app, "GET", "/users/me", Some("session=not-a-session"), None).await;
    assert_eq!(bogus.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_get_profile_hides_credentials() {
    let app = create_test_app();
    let cookie = sign_up(&app, "me@example.com").await;

    let response = send(&app, "GET", "/users/me", Some(&cookie), None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["personal_info"]["first_name"], "yusuf");
    assert_eq!(json["personal_info"]["last_name"], "haddad");
    assert!(json["personal_info"].get("password").is_none());
    assert!(json.get("password_reset_token").is_none());
    assert_eq!(json["profile"]["name"], "yusuf");
    assert_eq!(json["family_info"]["num_of_family_members"], 4);
    assert_eq!(json["immigration_info"]["country_of_origin"], "Syria");
}

#[tokio::test]
async fn test_update_profile_sections() {
    let app = create_test_app();
    let cookie = sign_up(&app, "update@example.com").await;

    let response = send(
        &app,
        "PATCH",
        "/users/me",
        Some(&cookie),
        Some(json!({
            "language_proficiency": {
                "assessment": [
                    { "listening": "B1", "reading": "B2", "speaking": "A2", "writing": "B1" }
                ]
            },
            "support_needs": { "challenges": "credential recognition" },
            "profile_picture": "https://cdn.example.com/p/yusuf.png"
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["language_proficiency"]["assessment"][0]["speaking"], "A2");
    assert_eq!(json["support_needs"]["challenges"], "credential recognition");
    assert_eq!(json["profile_picture"], "https://cdn.example.com/p/yusuf.png");
    assert_eq!(json["immigration_info"]["visa_type"], "refugee");
}

#[tokio::test]
async fn test_update_profile_rejects_invalid_section() {
    let app = create_test_app();
    let cookie = sign_up(&app, "invalid@example.com").await;

    let response = send(
        &app,
        "PATCH",
        "/users/me",
        Some(&cookie),
        Some(json!({ "social_integration": { "ethos": "community first" } })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(
        json["fields"],
        json!([
            "social_integration.interests_and_hobbies",
            "social_integration.preferred_social_activities"
        ])
    );
}

#[tokio::test]
async fn test_update_with_partial_section_lists_missing_fields() {
    let app = create_test_app();
    let cookie = sign_up(&app, "partial@example.com").await;

    let response = send(
        &app,
        "PATCH",
        "/users/me",
        Some(&cookie),
        Some(json!({ "education_and_employment": { "aspirations": "nurse" } })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(
        json["fields"],
        json!([
            "education_and_employment.highest_level_of_education",
            "education_and_employment.previous_work_experience"
        ])
    );
}

#[tokio::test]
async fn test_update_email_to_taken_address_conflicts() {
    let app = create_test_app();
    sign_up(&app, "first@example.com").await;
    let cookie = sign_up(&app, "second@example.com").await;

    let response = send(
        &app,
        "PATCH",
        "/users/me",
        Some(&cookie),
        Some(json!({ "email": "FIRST@example.com" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_change_password() {
    let app = create_test_app();
    let cookie = sign_up(&app, "change@example.com").await;

    let wrong = send(
        &app,
        "PUT",
        "/users/me/password",
        Some(&cookie),
        Some(json!({ "current_password": "nope", "new_password": "next-pass" })),
    )
    .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let ok = send(
        &app,
        "PUT",
        "/users/me/password",
        Some(&cookie),
        Some(json!({ "current_password": "initial-pass", "new_password": "next-pass" })),
    )
    .await;
    assert_eq!(ok.status(), StatusCode::NO_CONTENT);

    let login = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "change@example.com", "password": "next-pass" })),
    )
    .await;
    assert_eq!(login.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_search_history_round() {
    let app = create_test_app();
    let cookie = sign_up(&app, "search@example.com").await;

    let created = send(
        &app,
        "POST",
        "/users/me/search-history",
        Some(&cookie),
        Some(json!({ "search_query": "english conversation groups" })),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);

    let blank = send(
        &app,
        "POST",
        "/users/me/search-history",
        Some(&cookie),
        Some(json!({})),
    )
    .await;
    assert_eq!(blank.status(), StatusCode::CREATED);

    let response = send(&app, "GET", "/users/me/search-history", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["search_query"], "english conversation groups");
    assert!(entries[1]["search_query"].is_null());
    assert!(entries[0]["timestamp"].as_str().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_searches_are_all_recorded() {
    let app = create_test_app();
    let cookie = sign_up(&app, "busy@example.com").await;

    let requests: Vec<_> = (0..200)
        .map(|i| {
            let app = app.clone();
            let cookie = cookie.clone();
            tokio::spawn(async move {
                send(
                    &app,
                    "POST",
                    "/users/me/search-history",
                    Some(&cookie),
                    Some(json!({ "search_query": format!("query {i}") })),
                )
                .await
                .status()
            })
        })
        .collect();
    for request in requests {
        assert_eq!(request.await.unwrap(), StatusCode::CREATED);
    }

    let response = send(&app, "GET", "/users/me/search-history", Some(&cookie), None).await;
    let json = json_body(response).await;
    assert_eq!(json.as_array().unwrap().len(), 200);
}

#[tokio::test]
async fn test_link_chat_history_is_idempotent() {
    let app = create_test_app();
    let cookie = sign_up(&app, "chat@example.com").await;
    let chat_id = Uuid::new_v4();

    for _ in 0..2 {
        let response = send(
            &app,
            "POST",
            "/users/me/chat-history",
            Some(&cookie),
            Some(json!({ "chat_id": chat_id })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = send(&app, "GET", "/users/me", Some(&cookie), None).await;
    let json = json_body(response).await;
    assert_eq!(json["chat_history"], json!([chat_id.to_string()]));
}

#[tokio::test]
async fn test_delete_profile_ends_session() {
    let app = create_test_app();
    let cookie = sign_up(&app, "bye@example.com").await;

    let response = send(&app, "DELETE", "/users/me", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, "GET", "/users/me", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

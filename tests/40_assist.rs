mod common;

use axum::http::StatusCode;
use localserve_api::services::assist::{SUMMARY_FALLBACK_COPY, UNAVAILABLE_COPY};
use serde_json::json;

#[tokio::test]
async fn assist_requires_auth() {
    let (app, _) = common::test_app();
    let (status, _) = common::send_request(
        &app,
        "POST",
        "/api/assist",
        None,
        Some(json!({ "prompt": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn assist_requires_a_prompt() {
    let (app, store) = common::test_app();
    let user = common::seed_user(&store, "u1@example.com").await;
    let token = common::bearer_for(&user);

    let (status, body) =
        common::send_request(&app, "POST", "/api/assist", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "prompt required");

    let (status, _) = common::send_request(
        &app,
        "POST",
        "/api/assist",
        Some(&token),
        Some(json!({ "prompt": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unconfigured_key_degrades_to_static_copy_not_an_error() {
    let (app, store) = common::test_app();
    let user = common::seed_user(&store, "u1@example.com").await;
    let token = common::bearer_for(&user);

    let (status, body) = common::send_request(
        &app,
        "POST",
        "/api/assist",
        Some(&token),
        Some(json!({ "prompt": "recommend a plumber" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], UNAVAILABLE_COPY);
}

#[tokio::test]
async fn profile_summary_degrades_to_fallback_shape() {
    let (app, store) = common::test_app();
    let user = common::seed_user(&store, "u1@example.com").await;
    let token = common::bearer_for(&user);

    let (status, body) = common::send_request(
        &app,
        "POST",
        "/api/assist/profile-summary",
        Some(&token),
        Some(json!({
            "name": "Ana",
            "service": "Plumbing",
            "bio": "20 years of experience",
            "reviews": ["Fast and tidy", "Great communication"]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], SUMMARY_FALLBACK_COPY);
    assert!(body["highlights"].as_array().unwrap().is_empty());
    assert!(body["notes"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn profile_summary_validates_required_fields() {
    let (app, store) = common::test_app();
    let user = common::seed_user(&store, "u1@example.com").await;
    let token = common::bearer_for(&user);

    let (status, body) = common::send_request(
        &app,
        "POST",
        "/api/assist/profile-summary",
        Some(&token),
        Some(json!({ "name": "Ana" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "name, service and bio required");
}

#[tokio::test]
async fn unsupported_method_is_405() {
    let (app, store) = common::test_app();
    let user = common::seed_user(&store, "u1@example.com").await;
    let token = common::bearer_for(&user);

    let (status, _) = common::send_request(&app, "GET", "/api/assist", Some(&token), None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

//! HTTP-level tests for registration, login and the caller's profile.

mod common;

use axum::http::StatusCode;
use common::{body_json, get_auth, patch_json_auth, post_json, register_and_login, TEST_PASSWORD};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn test_register_returns_profile_without_hash(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/profile",
        json!({
            "email": "Jane@Example.com",
            "name": "Jane",
            "region": "Asia",
            "password": TEST_PASSWORD,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["email"], "jane@example.com");
    assert_eq!(json["data"]["region"], "Asia");
    assert_eq!(json["data"]["daily_expenses_limit"], "200.00");
    assert!(json["data"]["last_notified_date"].is_null());
    assert!(json["data"].get("password_hash").is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_register_validation(pool: PgPool) {
    let app = common::build_test_app(pool);

    let short_password = post_json(
        app.clone(),
        "/api/v1/profile",
        json!({ "email": "a@example.com", "name": "A", "password": "short" }),
    )
    .await;
    assert_eq!(short_password.status(), StatusCode::BAD_REQUEST);

    let bad_region = post_json(
        app.clone(),
        "/api/v1/profile",
        json!({ "email": "a@example.com", "name": "A", "region": "Mars", "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(bad_region.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(bad_region).await["code"], "VALIDATION_ERROR");

    let bad_email = post_json(
        app,
        "/api/v1/profile",
        json!({ "email": "nope", "name": "A", "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(bad_email.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_duplicate_email_conflicts(pool: PgPool) {
    let app = common::build_test_app(pool);
    register_and_login(&app, "dup@example.com").await;

    let response = post_json(
        app,
        "/api/v1/profile",
        json!({ "email": "dup@example.com", "name": "Again", "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_wrong_password(pool: PgPool) {
    let app = common::build_test_app(pool);
    register_and_login(&app, "wrongpw@example.com").await;

    let response = post_json(
        app,
        "/api/v1/login",
        json!({ "email": "wrongpw@example.com", "password": "incorrect-password" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_unknown_email(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/login",
        json!({ "email": "ghost@example.com", "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_get_and_update_profile(pool: PgPool) {
    let app = common::build_test_app(pool);
    let (user_id, token) = register_and_login(&app, "me@example.com").await;

    let response = get_auth(app.clone(), "/api/v1/profile", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["id"], user_id);

    let response = patch_json_auth(
        app.clone(),
        "/api/v1/profile",
        json!({ "name": "Renamed", "daily_expenses_limit": "55.50" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Renamed");
    assert_eq!(json["data"]["daily_expenses_limit"], "55.50");
    assert_eq!(json["data"]["region"], "Europe");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_update_profile_rejects_invalid_limit(pool: PgPool) {
    let app = common::build_test_app(pool);
    let (_, token) = register_and_login(&app, "limit@example.com").await;

    for limit in ["-1", "100000", "1.234"] {
        let response = patch_json_auth(
            app.clone(),
            "/api/v1/profile",
            json!({ "daily_expenses_limit": limit }),
            &token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "limit {limit}");
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_password_change_takes_effect(pool: PgPool) {
    let app = common::build_test_app(pool);
    let (_, token) = register_and_login(&app, "pw@example.com").await;

    let response = patch_json_auth(
        app.clone(),
        "/api/v1/profile",
        json!({ "password": "a-brand-new-password" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let old = post_json(
        app.clone(),
        "/api/v1/login",
        json!({ "email": "pw@example.com", "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);

    let new = post_json(
        app,
        "/api/v1/login",
        json!({ "email": "pw@example.com", "password": "a-brand-new-password" }),
    )
    .await;
    assert_eq!(new.status(), StatusCode::OK);
}

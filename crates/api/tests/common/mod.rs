#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use dailyspend_api::auth::jwt::JwtConfig;
use dailyspend_api::background::spawn_limit_worker;
use dailyspend_api::config::{LimitConfig, ServerConfig};
use dailyspend_api::router::build_app_router;
use dailyspend_api::state::AppState;
use dailyspend_core::notifier::{Notifier, NotifyError, OutgoingMessage};
use dailyspend_db::PgLedger;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
        limits: LimitConfig {
            operator_email: "operator@dailyspend.test".to_string(),
            notify_timeout: Duration::from_secs(2),
            ..LimitConfig::default()
        },
    }
}

/// Notifier that records every message it is asked to send.
#[derive(Default)]
pub struct Outbox {
    sent: Mutex<Vec<OutgoingMessage>>,
}

impl Outbox {
    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for Outbox {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Build the full application router (same middleware stack as `main.rs`)
/// with a limit-check worker feeding into a recording [`Outbox`].
pub fn build_test_app_with_outbox(pool: PgPool) -> (Router, Arc<Outbox>) {
    let config = test_config();
    let ledger = PgLedger::new(pool.clone());
    let outbox = Arc::new(Outbox::default());

    let (limit_checks, _worker) = spawn_limit_worker(
        ledger.clone(),
        Arc::clone(&outbox),
        &config.limits,
        CancellationToken::new(),
    );

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ledger,
        limit_checks,
    };

    (build_app_router(state, &config), outbox)
}

pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_outbox(pool).0
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, None, None)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, Some(token), None)).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, request(Method::POST, uri, None, Some(body))).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response<Body> {
    send(app, request(Method::POST, uri, Some(token), Some(body))).await
}

pub async fn patch_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response<Body> {
    send(app, request(Method::PATCH, uri, Some(token), Some(body))).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request(Method::DELETE, uri, Some(token), None)).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Register a user through the API and log in. Returns `(user_id, token)`.
pub async fn register_and_login(app: &Router, email: &str) -> (i64, String) {
    let response = post_json(
        app.clone(),
        "/api/v1/profile",
        serde_json::json!({
            "email": email,
            "name": "Test User",
            "region": "Europe",
            "password": TEST_PASSWORD,
        }),
    )
    .await;
    assert_eq!(response.status(), 201, "registration should succeed");
    let user_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_json(
        app.clone(),
        "/api/v1/login",
        serde_json::json!({ "email": email, "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), 200, "login should succeed");
    let token = body_json(response).await["data"]["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    (user_id, token)
}

/// Id of a seeded global category.
pub async fn global_category_id(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar("SELECT id FROM categories WHERE name = $1 AND user_id IS NULL")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Wait until `condition` holds, polling for up to two seconds.
pub async fn eventually<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

//! Shared helpers for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use tiketon_api::auth::jwt::{generate_access_token, JwtConfig};
use tiketon_api::certificates::BuiltinRenderer;
use tiketon_api::config::ServerConfig;
use tiketon_api::router::build_app_router;
use tiketon_api::state::AppState;
use tiketon_core::accrual::AccrualPolicy;
use tiketon_core::roles::{ROLE_ADMIN, ROLE_TEAM_LEADER};
use tiketon_db::models::event::{CreateEvent, Event};
use tiketon_db::models::scanner::{CreateScanner, Scanner};
use tiketon_db::models::user::{CreateUser, User};
use tiketon_db::repositories::{EventRepo, ScannerRepo, UserRepo};
use tiketon_notify::{NotificationDispatcher, PgAuditSink};
use tiketon_worker::PurgeEngine;

const TEST_SECRET: &str = "integration-test-secret-long-enough-for-hmac";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            access_token_expiry_mins: 15,
        },
        accrual: AccrualPolicy::LatenessDeduction,
    }
}

/// The full application router over `pool`, with no notification channel
/// configured (every dispatch is audited as undeliverable).
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config())
}

pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    let dispatcher =
        NotificationDispatcher::new(None, None, Arc::new(PgAuditSink::new(pool.clone())));
    let state = AppState {
        purge: PurgeEngine::new(pool.clone(), dispatcher.clone()),
        pool,
        config: Arc::new(config),
        dispatcher,
        renderer: Arc::new(BuiltinRenderer),
    };
    build_app_router(state)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn token_for(user: &User) -> String {
    generate_access_token(user.id, &user.role, &test_config().jwt).unwrap()
}

pub async fn user(pool: &PgPool, email: &str, role: &str, scanner_id: Option<i64>) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            first_name: "Aida".to_string(),
            last_name: "Serikova".to_string(),
            email: email.to_string(),
            telegram_id: None,
            role: role.to_string(),
            scanner_id,
        },
    )
    .await
    .unwrap()
}

pub async fn admin(pool: &PgPool) -> User {
    user(pool, "admin@example.com", ROLE_ADMIN, None).await
}

pub async fn leader(pool: &PgPool) -> User {
    user(pool, "leader@example.com", ROLE_TEAM_LEADER, None).await
}

pub async fn scanner(pool: &PgPool, first: &str, last: &str) -> Scanner {
    ScannerRepo::create(
        pool,
        &CreateScanner {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: None,
            telegram_id: None,
        },
    )
    .await
    .unwrap()
}

pub async fn event(pool: &PgPool, created_by: i64, max_scanners: i32, event_date: NaiveDate) -> Event {
    EventRepo::create(
        pool,
        created_by,
        &CreateEvent {
            name: "Spring Gala".to_string(),
            date: event_date,
            start_date: None,
            end_date: None,
            location: Some("Main hall".to_string()),
            max_scanners,
            duration_hours: None,
        },
    )
    .await
    .unwrap()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn post(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn put_json(app: Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Assert the status and return the JSON body.
pub async fn expect_json(response: Response<Body>, status: StatusCode) -> Value {
    let actual = response.status();
    let json = body_json(response).await;
    assert_eq!(actual, status, "unexpected status, body: {json}");
    json
}

//! Admin surface: users, team leaders, purge settings and the notification log.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    admin, build_test_app, date, event, expect_json, get, leader, post_json, put_json, scanner,
    send, token_for, user,
};
use serde_json::json;
use sqlx::PgPool;
use tiketon_core::roles::ROLE_ADMIN;
use tiketon_db::repositories::EventRepo;

// ---------------------------------------------------------------------------
// Test: purge settings
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn purge_settings_default_then_replace(pool: PgPool) {
    let admin = admin(&pool).await;
    let token = token_for(&admin);

    let response = get(build_test_app(pool.clone()), "/api/v1/admin/purge/settings", &token).await;
    let json = expect_json(response, StatusCode::OK).await;
    assert!(json["data"]["settings"].is_null());
    assert_eq!(json["data"]["effective"]["from_defaults"], true);
    assert_eq!(json["data"]["effective"]["notification_days_before"], 7);

    let response = put_json(
        build_test_app(pool.clone()),
        "/api/v1/admin/purge/settings",
        &token,
        json!({ "purge_date": "2026-09-01", "notification_days_before": 14, "is_active": false }),
    )
    .await;
    expect_json(response, StatusCode::OK).await;

    let response = get(build_test_app(pool), "/api/v1/admin/purge/settings", &token).await;
    let json = expect_json(response, StatusCode::OK).await;
    assert_eq!(json["data"]["settings"]["notification_days_before"], 14);
    assert_eq!(json["data"]["effective"]["active"], false);
    assert_eq!(json["data"]["effective"]["purge_date"], "2026-09-01");
    assert_eq!(json["data"]["effective"]["from_defaults"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn out_of_range_notification_days_is_400(pool: PgPool) {
    let admin = admin(&pool).await;
    let response = put_json(
        build_test_app(pool),
        "/api/v1/admin/purge/settings",
        &token_for(&admin),
        json!({ "purge_date": null, "notification_days_before": 400, "is_active": true }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn preview_reports_without_deleting(pool: PgPool) {
    let admin = admin(&pool).await;
    let leader = leader(&pool).await;
    let old = event(&pool, leader.id, 5, date(2025, 1, 10)).await;

    let response = get(
        build_test_app(pool.clone()),
        "/api/v1/admin/purge/preview?today=2026-03-01",
        &token_for(&admin),
    )
    .await;
    let json = expect_json(response, StatusCode::OK).await;
    assert_eq!(json["data"]["mode"], "dry_run");
    assert_eq!(json["data"]["expiring"][0]["id"], old.id);
    assert_eq!(json["data"]["deleted"], 0);
    assert_eq!(json["data"]["notifications"]["sent"], 0);

    assert!(EventRepo::find_by_id(&pool, old.id).await.unwrap().is_some());
}

// ---------------------------------------------------------------------------
// Test: users and team leaders
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_team_leader_reuses_matching_scanner(pool: PgPool) {
    let admin = admin(&pool).await;
    let token = token_for(&admin);
    let existing = scanner(&pool, "Marat", "Ospanov").await;

    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/admin/team-leaders",
        &token,
        json!({ "first_name": "Marat", "last_name": "Ospanov", "email": "marat@example.com" }),
    )
    .await;
    let json = expect_json(response, StatusCode::CREATED).await;
    assert_eq!(json["data"]["scanner_id"], existing.id);
    assert_eq!(json["data"]["scanner_created"], false);
    assert_eq!(json["data"]["user"]["role"], "team_leader");

    let response = post_json(
        build_test_app(pool),
        "/api/v1/admin/team-leaders",
        &token,
        json!({ "first_name": "Other", "last_name": "Person", "email": "MARAT@example.com" }),
    )
    .await;
    let json = expect_json(response, StatusCode::CONFLICT).await;
    assert_eq!(json["code"], "CONFLICT");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_team_leader_creates_scanner(pool: PgPool) {
    let admin = admin(&pool).await;
    let response = post_json(
        build_test_app(pool),
        "/api/v1/admin/team-leaders",
        &token_for(&admin),
        json!({ "first_name": "Saule", "last_name": "Nurlanova", "email": "saule@example.com" }),
    )
    .await;
    let json = expect_json(response, StatusCode::CREATED).await;
    assert_eq!(json["data"]["scanner_created"], true);
    assert_eq!(json["data"]["user"]["scanner_id"], json["data"]["scanner_id"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deactivate_user_and_filter_by_role(pool: PgPool) {
    let admin = admin(&pool).await;
    let token = token_for(&admin);
    let second = user(&pool, "second-admin@example.com", ROLE_ADMIN, None).await;
    leader(&pool).await;

    let response = send(
        build_test_app(pool.clone()),
        Method::PATCH,
        &format!("/api/v1/admin/users/{}", second.id),
        Some(&token),
        Some(json!({ "is_active": false })),
    )
    .await;
    let json = expect_json(response, StatusCode::OK).await;
    assert_eq!(json["data"]["is_active"], false);

    let response = get(build_test_app(pool.clone()), "/api/v1/admin/users?role=admin", &token).await;
    let json = expect_json(response, StatusCode::OK).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    let response = get(build_test_app(pool), "/api/v1/admin/users?role=owner", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Test: notifications
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_notification_without_channels_is_503_and_audited(pool: PgPool) {
    let admin = admin(&pool).await;
    let token = token_for(&admin);

    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/admin/notifications/test",
        &token,
        json!({ "email": "ops@example.com" }),
    )
    .await;
    let json = expect_json(response, StatusCode::SERVICE_UNAVAILABLE).await;
    assert_eq!(json["code"], "CONFIGURATION_MISSING");

    let response = get(
        build_test_app(pool),
        "/api/v1/admin/notifications?is_test=true",
        &token,
    )
    .await;
    let json = expect_json(response, StatusCode::OK).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["data"][0]["channel"], "none");
    assert_eq!(json["data"][0]["delivered"], false);
    assert_eq!(json["data"][0]["is_test"], true);
    assert_eq!(json["data"][0]["recipient_email"], "ops@example.com");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_notification_needs_a_contact(pool: PgPool) {
    let admin = admin(&pool).await;
    let response = post_json(
        build_test_app(pool),
        "/api/v1/admin/notifications/test",
        &token_for(&admin),
        json!({ "message": "hello" }),
    )
    .await;
    let json = expect_json(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn channel_status_reports_configuration(pool: PgPool) {
    let admin = admin(&pool).await;
    let response = get(
        build_test_app(pool),
        "/api/v1/admin/notifications/channels",
        &token_for(&admin),
    )
    .await;
    let json = expect_json(response, StatusCode::OK).await;
    assert_eq!(json["data"], json!({ "telegram": false, "email": false }));
}

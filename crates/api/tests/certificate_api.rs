//! Certificate downloads consume pending hours.

mod common;

use std::io::{Cursor, Read};

use axum::http::{header, StatusCode};
use common::{
    admin, body_bytes, build_test_app, date, event, expect_json, get, leader, post, scanner,
    token_for,
};
use sqlx::PgPool;
use tiketon_api::certificates::MANIFEST_FILE;
use tiketon_core::accrual::AccrualPolicy;
use tiketon_db::models::event::Event;
use tiketon_db::models::participant::Participant;
use tiketon_db::repositories::ParticipantRepo;
use zip::ZipArchive;

async fn participate(pool: &PgPool, event: &Event, scanner_id: i64) -> Participant {
    ParticipantRepo::add(pool, event.id, scanner_id).await.unwrap()
}

async fn set_duration(pool: &PgPool, event: &Event, hours: f64) {
    ParticipantRepo::set_duration(pool, event.id, hours, AccrualPolicy::LatenessDeduction)
        .await
        .unwrap();
}

fn unzip(bytes: Vec<u8>) -> ZipArchive<Cursor<Vec<u8>>> {
    ZipArchive::new(Cursor::new(bytes)).unwrap()
}

fn manifest(archive: &mut ZipArchive<Cursor<Vec<u8>>>) -> serde_json::Value {
    let mut raw = String::new();
    archive
        .by_name(MANIFEST_FILE)
        .unwrap()
        .read_to_string(&mut raw)
        .unwrap();
    serde_json::from_str(&raw).unwrap()
}

// ---------------------------------------------------------------------------
// Test: single participation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn participation_certificate_zeroes_hours(pool: PgPool) {
    let leader = leader(&pool).await;
    let token = token_for(&leader);
    let event = event(&pool, leader.id, 5, date(2026, 5, 1)).await;
    let volunteer = scanner(&pool, "Dana", "Abenova").await;
    let entry = participate(&pool, &event, volunteer.id).await;
    set_duration(&pool, &event, 3.0).await;

    let uri = format!(
        "/api/v1/events/{}/participants/{}/certificate?format=txt",
        event.id, entry.id
    );
    let response = post(build_test_app(pool.clone()), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.contains(r#"filename="certificate_Abenova_Spring_Gala.txt""#));

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.contains("DANA ABENOVA"));
    assert!(text.contains("contributed 3 hours of volunteer work"));
    assert!(text.contains("at \"Spring Gala\" on 01.05.2026"));

    // The hours are consumed; a second download has nothing to certify.
    let response = post(build_test_app(pool.clone()), &uri, &token).await;
    let json = expect_json(response, StatusCode::UNPROCESSABLE_ENTITY).await;
    assert_eq!(json["code"], "NO_HOURS_AVAILABLE");

    let stored = ParticipantRepo::find_by_id(&pool, entry.id).await.unwrap().unwrap();
    assert_eq!(stored.hours_awarded, 0.0);

    // Per-participation issuance does not touch the cumulative total.
    let response = get(
        build_test_app(pool),
        &format!("/api/v1/scanners/{}/events", volunteer.id),
        &token,
    )
    .await;
    let summary = expect_json(response, StatusCode::OK).await;
    assert_eq!(summary["data"]["current_hours"], 0.0);
    assert_eq!(summary["data"]["scanner"]["total_certificate_hours"], 0.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn participant_from_another_event_is_404(pool: PgPool) {
    let leader = leader(&pool).await;
    let first = event(&pool, leader.id, 5, date(2026, 5, 1)).await;
    let second = event(&pool, leader.id, 5, date(2026, 5, 2)).await;
    let volunteer = scanner(&pool, "Dana", "Abenova").await;
    let entry = participate(&pool, &first, volunteer.id).await;
    set_duration(&pool, &first, 2.0).await;

    let response = post(
        build_test_app(pool.clone()),
        &format!("/api/v1/events/{}/participants/{}/certificate", second.id, entry.id),
        &token_for(&leader),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let stored = ParticipantRepo::find_by_id(&pool, entry.id).await.unwrap().unwrap();
    assert_eq!(stored.hours_awarded, 2.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn pdf_is_the_default_format(pool: PgPool) {
    let leader = leader(&pool).await;
    let event = event(&pool, leader.id, 5, date(2026, 5, 1)).await;
    let volunteer = scanner(&pool, "Dana", "Abenova").await;
    let entry = participate(&pool, &event, volunteer.id).await;
    set_duration(&pool, &event, 2.0).await;

    let response = post(
        build_test_app(pool),
        &format!("/api/v1/events/{}/participants/{}/certificate", event.id, entry.id),
        &token_for(&leader),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    let bytes = body_bytes(response).await;
    assert!(bytes.starts_with(b"%PDF-"));
}

// ---------------------------------------------------------------------------
// Test: aggregate per scanner
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn scanner_certificate_sums_and_accumulates(pool: PgPool) {
    let leader = leader(&pool).await;
    let token = token_for(&leader);
    let spring = event(&pool, leader.id, 5, date(2026, 4, 10)).await;
    let summer = event(&pool, leader.id, 5, date(2026, 6, 20)).await;
    let volunteer = scanner(&pool, "Dana", "Abenova").await;
    participate(&pool, &spring, volunteer.id).await;
    participate(&pool, &summer, volunteer.id).await;
    set_duration(&pool, &spring, 2.5).await;
    set_duration(&pool, &summer, 1.75).await;

    let uri = format!("/api/v1/scanners/{}/certificate?format=txt&itemized=true", volunteer.id);
    let response = post(build_test_app(pool.clone()), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.contains("contributed 4 hours of volunteer work"));
    assert!(text.contains("during the period 10.04.2026 - 20.06.2026"));
    assert!(text.contains("- Spring Gala (10.04.2026): 2:30"));
    assert!(text.contains("- Spring Gala (20.06.2026): 1:45"));

    let response = get(
        build_test_app(pool.clone()),
        &format!("/api/v1/scanners/{}/events", volunteer.id),
        &token,
    )
    .await;
    let summary = expect_json(response, StatusCode::OK).await;
    assert_eq!(summary["data"]["current_hours"], 0.0);
    assert_eq!(summary["data"]["scanner"]["total_certificate_hours"], 4.25);

    let response = post(build_test_app(pool), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ---------------------------------------------------------------------------
// Test: batches
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn event_batch_lists_issued_and_failed(pool: PgPool) {
    let leader = leader(&pool).await;
    let token = token_for(&leader);
    let event = event(&pool, leader.id, 5, date(2026, 5, 1)).await;
    let dana = scanner(&pool, "Dana", "Abenova").await;
    let erlan = scanner(&pool, "Erlan", "Bekov").await;
    let claimed = participate(&pool, &event, dana.id).await;
    participate(&pool, &event, erlan.id).await;
    set_duration(&pool, &event, 2.0).await;

    // Dana's hours are consumed first, so the batch can only certify Erlan.
    let response = post(
        build_test_app(pool.clone()),
        &format!("/api/v1/events/{}/participants/{}/certificate", event.id, claimed.id),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post(
        build_test_app(pool.clone()),
        &format!("/api/v1/events/{}/certificates?format=txt", event.id),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");

    let mut archive = unzip(body_bytes(response).await);
    let manifest = manifest(&mut archive);
    assert_eq!(manifest["issued"].as_array().unwrap().len(), 1);
    assert_eq!(manifest["issued"][0]["scanner_id"], erlan.id);
    assert_eq!(manifest["failed"].as_array().unwrap().len(), 1);
    assert_eq!(manifest["failed"][0]["id"], claimed.id);
    assert_eq!(archive.len(), 2);

    // Nothing left: the whole batch fails.
    let response = post(
        build_test_app(pool),
        &format!("/api/v1/events/{}/certificates", event.id),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn all_scanners_batch_is_admin_only(pool: PgPool) {
    let leader = leader(&pool).await;
    let admin = admin(&pool).await;
    let event = event(&pool, leader.id, 5, date(2026, 5, 1)).await;
    let dana = scanner(&pool, "Dana", "Abenova").await;
    let erlan = scanner(&pool, "Erlan", "Bekov").await;
    participate(&pool, &event, dana.id).await;
    participate(&pool, &event, erlan.id).await;
    set_duration(&pool, &event, 3.0).await;

    let response = post(build_test_app(pool.clone()), "/api/v1/certificates/scanners", &token_for(&leader)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post(build_test_app(pool.clone()), "/api/v1/certificates/scanners", &token_for(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let mut archive = unzip(body_bytes(response).await);
    let manifest = manifest(&mut archive);
    assert_eq!(manifest["issued"].as_array().unwrap().len(), 2);
    assert_eq!(manifest["format"], "pdf");
    assert!(archive.by_name(&format!("certificate_Abenova_Dana_{}.pdf", dana.id)).is_ok());
    assert!(archive.by_name(&format!("certificate_Bekov_Erlan_{}.pdf", erlan.id)).is_ok());

    let pending = ParticipantRepo::list_for_event(&pool, event.id).await.unwrap();
    assert!(pending.iter().all(|p| p.hours_awarded == 0.0));
}

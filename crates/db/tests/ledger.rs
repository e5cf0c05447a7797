//! Integration tests for the participation ledger.

mod common;

use assert_matches::assert_matches;
use sqlx::PgPool;
use tiketon_core::accrual::AccrualPolicy;
use tiketon_core::error::CoreError;
use tiketon_db::models::participant::UpdateLateness;
use tiketon_db::repositories::ParticipantRepo;
use tiketon_db::LedgerError;

use common::{date, event, hours_of, leader, scanner, user};

#[sqlx::test(migrations = "../../db/migrations")]
async fn add_starts_at_zero_hours(pool: PgPool) {
    let leader = leader(&pool).await;
    let event = event(&pool, leader.id, 5, date(2026, 5, 1)).await;
    let scanner = scanner(&pool, "Dana", "Abenova").await;

    let participant = ParticipantRepo::add(&pool, event.id, scanner.id).await.unwrap();

    assert_eq!(participant.event_id, event.id);
    assert_eq!(participant.hours_awarded, 0.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_add_is_rejected_and_keeps_one_entry(pool: PgPool) {
    let leader = leader(&pool).await;
    let event = event(&pool, leader.id, 5, date(2026, 5, 1)).await;
    let scanner = scanner(&pool, "Dana", "Abenova").await;

    ParticipantRepo::add(&pool, event.id, scanner.id).await.unwrap();
    let second = ParticipantRepo::add(&pool, event.id, scanner.id).await;

    assert_matches!(
        second,
        Err(LedgerError::Core(CoreError::DuplicateParticipant { event_id, scanner_id }))
            if event_id == event.id && scanner_id == scanner.id
    );
    let listed = ParticipantRepo::list_for_event(&pool, event.id).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn add_beyond_capacity_fails(pool: PgPool) {
    let leader = leader(&pool).await;
    let event = event(&pool, leader.id, 1, date(2026, 5, 1)).await;
    let first = scanner(&pool, "Dana", "Abenova").await;
    let second = scanner(&pool, "Ruslan", "Tokayev").await;

    ParticipantRepo::add(&pool, event.id, first.id).await.unwrap();
    let result = ParticipantRepo::add(&pool, event.id, second.id).await;

    assert_matches!(
        result,
        Err(LedgerError::Core(CoreError::CapacityExceeded { max_scanners: 1, .. }))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn add_to_missing_event_is_not_found(pool: PgPool) {
    let scanner = scanner(&pool, "Dana", "Abenova").await;
    let result = ParticipantRepo::add(&pool, 9999, scanner.id).await;
    assert_matches!(
        result,
        Err(LedgerError::Core(CoreError::NotFound { entity: "event", id: 9999 }))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn bulk_add_reports_duplicates_and_overflow(pool: PgPool) {
    let leader = leader(&pool).await;
    let event = event(&pool, leader.id, 2, date(2026, 5, 1)).await;
    let a = scanner(&pool, "Dana", "Abenova").await;
    let b = scanner(&pool, "Ruslan", "Tokayev").await;
    let c = scanner(&pool, "Madi", "Nurlanov").await;

    ParticipantRepo::add(&pool, event.id, a.id).await.unwrap();
    let outcome = ParticipantRepo::bulk_add(&pool, event.id, &[a.id, b.id, b.id, c.id])
        .await
        .unwrap();

    assert_eq!(outcome.added.len(), 1);
    assert_eq!(outcome.added[0].scanner_id, b.id);
    assert_eq!(outcome.duplicates, vec![a.id, b.id]);
    assert_eq!(outcome.over_capacity, vec![c.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn bulk_add_with_unknown_scanner_adds_nothing(pool: PgPool) {
    let leader = leader(&pool).await;
    let event = event(&pool, leader.id, 5, date(2026, 5, 1)).await;
    let a = scanner(&pool, "Dana", "Abenova").await;

    let result = ParticipantRepo::bulk_add(&pool, event.id, &[a.id, 424242]).await;

    assert_matches!(
        result,
        Err(LedgerError::Core(CoreError::NotFound { entity: "scanner", id: 424242 }))
    );
    assert!(ParticipantRepo::list_for_event(&pool, event.id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn remove_is_idempotent(pool: PgPool) {
    let leader = leader(&pool).await;
    let event = event(&pool, leader.id, 5, date(2026, 5, 1)).await;
    let scanner = scanner(&pool, "Dana", "Abenova").await;
    let participant = ParticipantRepo::add(&pool, event.id, scanner.id).await.unwrap();

    assert!(ParticipantRepo::remove(&pool, event.id, participant.id).await.unwrap());
    assert!(!ParticipantRepo::remove(&pool, event.id, participant.id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn setting_duration_recomputes_every_participant(pool: PgPool) {
    let leader = leader(&pool).await;
    let event = event(&pool, leader.id, 5, date(2026, 5, 1)).await;
    let mut ids = Vec::new();
    for (first, last) in [("Dana", "Abenova"), ("Ruslan", "Tokayev"), ("Madi", "Nurlanov")] {
        let scanner = scanner(&pool, first, last).await;
        ids.push(ParticipantRepo::add(&pool, event.id, scanner.id).await.unwrap().id);
    }

    let outcome = ParticipantRepo::set_duration(&pool, event.id, 4.0, AccrualPolicy::LatenessDeduction)
        .await
        .unwrap();

    assert_eq!(outcome.participants.len(), 3);
    for id in ids {
        assert_eq!(hours_of(&pool, id).await, 4.0);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn lateness_is_deducted_on_recompute(pool: PgPool) {
    let leader = leader(&pool).await;
    let event = event(&pool, leader.id, 5, date(2026, 5, 1)).await;
    let late = scanner(&pool, "Dana", "Abenova").await;
    let very_late = scanner(&pool, "Ruslan", "Tokayev").await;
    let p_late = ParticipantRepo::add(&pool, event.id, late.id).await.unwrap();
    let p_very_late = ParticipantRepo::add(&pool, event.id, very_late.id).await.unwrap();

    ParticipantRepo::set_lateness(
        &pool,
        event.id,
        p_late.id,
        &UpdateLateness {
            is_late: true,
            late_minutes: Some(30),
        },
    )
    .await
    .unwrap();
    ParticipantRepo::set_lateness(
        &pool,
        event.id,
        p_very_late.id,
        &UpdateLateness {
            is_late: true,
            late_minutes: Some(600),
        },
    )
    .await
    .unwrap();

    // Lateness alone does not touch hours.
    assert_eq!(hours_of(&pool, p_late.id).await, 0.0);

    ParticipantRepo::set_duration(&pool, event.id, 4.0, AccrualPolicy::LatenessDeduction)
        .await
        .unwrap();

    assert_eq!(hours_of(&pool, p_late.id).await, 3.5);
    assert_eq!(hours_of(&pool, p_very_late.id).await, 0.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn leader_bonus_applies_to_creator_scanner(pool: PgPool) {
    let leader_scanner = scanner(&pool, "Aida", "Serikova").await;
    let leader = user(&pool, "aida@example.com", "team_leader", Some(leader_scanner.id)).await;
    let event = event(&pool, leader.id, 5, date(2026, 5, 1)).await;
    let volunteer = scanner(&pool, "Dana", "Abenova").await;

    let p_leader = ParticipantRepo::add(&pool, event.id, leader_scanner.id).await.unwrap();
    let p_volunteer = ParticipantRepo::add(&pool, event.id, volunteer.id).await.unwrap();

    ParticipantRepo::set_duration(
        &pool,
        event.id,
        4.0,
        AccrualPolicy::LeaderBonus { multiplier: 1.5 },
    )
    .await
    .unwrap();

    assert_eq!(hours_of(&pool, p_leader.id).await, 6.0);
    assert_eq!(hours_of(&pool, p_volunteer.id).await, 4.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn late_joiner_waits_for_explicit_recompute(pool: PgPool) {
    let leader = leader(&pool).await;
    let event = event(&pool, leader.id, 5, date(2026, 5, 1)).await;
    let first = scanner(&pool, "Dana", "Abenova").await;
    ParticipantRepo::add(&pool, event.id, first.id).await.unwrap();
    ParticipantRepo::set_duration(&pool, event.id, 3.0, AccrualPolicy::LatenessDeduction)
        .await
        .unwrap();

    let late_joiner = scanner(&pool, "Ruslan", "Tokayev").await;
    let joined = ParticipantRepo::add(&pool, event.id, late_joiner.id).await.unwrap();
    assert_eq!(joined.hours_awarded, 0.0);

    ParticipantRepo::recompute(&pool, event.id, AccrualPolicy::LatenessDeduction)
        .await
        .unwrap();
    assert_eq!(hours_of(&pool, joined.id).await, 3.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn negative_duration_is_rejected(pool: PgPool) {
    let leader = leader(&pool).await;
    let event = event(&pool, leader.id, 5, date(2026, 5, 1)).await;
    let result =
        ParticipantRepo::set_duration(&pool, event.id, -1.0, AccrualPolicy::LatenessDeduction).await;
    assert_matches!(result, Err(LedgerError::Core(CoreError::Validation(_))));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn lateness_on_unknown_participant_is_not_found(pool: PgPool) {
    let leader = leader(&pool).await;
    let event = event(&pool, leader.id, 5, date(2026, 5, 1)).await;
    let result = ParticipantRepo::set_lateness(
        &pool,
        event.id,
        777,
        &UpdateLateness {
            is_late: false,
            late_minutes: None,
        },
    )
    .await;
    assert_matches!(
        result,
        Err(LedgerError::Core(CoreError::NotFound { entity: "participant", .. }))
    );
}

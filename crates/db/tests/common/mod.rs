//! Fixtures shared by the repository integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use sqlx::PgPool;
use tiketon_core::roles::{ROLE_ADMIN, ROLE_TEAM_LEADER};
use tiketon_db::models::event::{CreateEvent, Event};
use tiketon_db::models::scanner::{CreateScanner, Scanner};
use tiketon_db::models::user::{CreateUser, User};
use tiketon_db::repositories::{EventRepo, ScannerRepo, UserRepo};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn scanner(pool: &PgPool, first: &str, last: &str) -> Scanner {
    ScannerRepo::create(
        pool,
        &CreateScanner {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: Some(format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase())),
            telegram_id: None,
        },
    )
    .await
    .unwrap()
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

pub async fn leader(pool: &PgPool) -> User {
    user(pool, "leader@example.com", ROLE_TEAM_LEADER, None).await
}

pub async fn admin(pool: &PgPool) -> User {
    user(pool, "admin@example.com", ROLE_ADMIN, None).await
}

pub async fn event(pool: &PgPool, created_by: i64, max_scanners: i32, event_date: NaiveDate) -> Event {
    EventRepo::create(
        pool,
        created_by,
        &CreateEvent {
            name: format!("Concert {event_date}"),
            date: event_date,
            start_date: None,
            end_date: None,
            location: Some("Arena".to_string()),
            max_scanners,
            duration_hours: None,
        },
    )
    .await
    .unwrap()
}

pub async fn hours_of(pool: &PgPool, participant_id: i64) -> f64 {
    sqlx::query_scalar::<_, f64>("SELECT hours_awarded FROM event_participants WHERE id = $1")
        .bind(participant_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

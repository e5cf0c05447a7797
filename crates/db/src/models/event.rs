//! Event entity and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tiketon_core::types::{Date, DbId, Timestamp};
use validator::Validate;

/// A row from the `events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: DbId,
    pub name: String,
    pub date: Date,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub location: Option<String>,
    pub max_scanners: i32,
    pub duration_hours: Option<f64>,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating an event. `created_by` comes from the authenticated user.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEvent {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    pub date: Date,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    #[validate(length(max = 256))]
    pub location: Option<String>,
    #[validate(range(min = 1))]
    pub max_scanners: i32,
    #[validate(range(min = 0.0))]
    pub duration_hours: Option<f64>,
}

/// DTO for editing event details. Duration changes go through the ledger
/// (`PUT /events/{id}/duration`) so that participants are recomputed.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateEvent {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    pub date: Option<Date>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    #[validate(length(max = 256))]
    pub location: Option<String>,
    #[validate(range(min = 1))]
    pub max_scanners: Option<i32>,
}

/// Event joined with its creator's contact details, used by the purge.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RetentionEvent {
    pub id: DbId,
    pub name: String,
    pub date: Date,
    pub created_by: DbId,
    pub creator_first_name: String,
    pub creator_last_name: String,
    pub creator_email: String,
    pub creator_telegram_id: Option<String>,
}

impl RetentionEvent {
    pub fn creator_name(&self) -> String {
        format!("{} {}", self.creator_first_name, self.creator_last_name)
    }
}

//! Participation ledger entries (`event_participants`).

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tiketon_core::accrual::format_hours_minutes;
use tiketon_core::types::{Date, DbId, Timestamp};
use validator::Validate;

/// A row from the `event_participants` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Participant {
    pub id: DbId,
    pub event_id: DbId,
    pub scanner_id: DbId,
    pub is_late: bool,
    pub late_minutes: Option<i32>,
    /// Pending, not yet certified hours. Always >= 0.
    pub hours_awarded: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Ledger entry joined with the scanner's name, as listed on an event page.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ParticipantWithScanner {
    pub id: DbId,
    pub event_id: DbId,
    pub scanner_id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub is_late: bool,
    pub late_minutes: Option<i32>,
    pub hours_awarded: f64,
}

/// [`ParticipantWithScanner`] plus the `H:MM` display form of its hours.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantListing {
    #[serde(flatten)]
    pub entry: ParticipantWithScanner,
    pub hours_display: String,
}

impl From<ParticipantWithScanner> for ParticipantListing {
    fn from(entry: ParticipantWithScanner) -> Self {
        let hours_display = format_hours_minutes(entry.hours_awarded);
        Self {
            entry,
            hours_display,
        }
    }
}

/// Request body for adding one scanner to an event.
#[derive(Debug, Clone, Deserialize)]
pub struct AddParticipant {
    pub scanner_id: DbId,
}

/// Request body for adding several scanners at once.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BulkAddParticipants {
    #[validate(length(min = 1, max = 500))]
    pub scanner_ids: Vec<DbId>,
}

/// Result of a bulk add. Scanners are taken in request order until the
/// event is full; the rest are counted as `over_capacity`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkAddOutcome {
    pub added: Vec<Participant>,
    pub duplicates: Vec<DbId>,
    pub over_capacity: Vec<DbId>,
}

/// Request body for recording lateness.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateLateness {
    pub is_late: bool,
    #[validate(range(min = 0, max = 1440))]
    pub late_minutes: Option<i32>,
}

/// Request body for setting an event's duration.
#[derive(Debug, Clone, Deserialize)]
pub struct SetDuration {
    pub duration_hours: f64,
}

/// Outcome of a recompute: the new duration and every updated entry.
#[derive(Debug, Clone, Serialize)]
pub struct RecomputeOutcome {
    pub event_id: DbId,
    pub duration_hours: f64,
    pub participants: Vec<Participant>,
}

/// A locked ledger entry with what a single-participation certificate
/// needs to render.
#[derive(Debug, Clone, FromRow)]
pub struct ParticipationClaimRow {
    pub id: DbId,
    pub scanner_id: DbId,
    pub hours_awarded: f64,
    pub first_name: String,
    pub last_name: String,
    pub event_name: String,
    pub event_date: Date,
    pub leader_first_name: String,
    pub leader_last_name: String,
}

/// A locked pending entry contributing to an aggregate certificate.
#[derive(Debug, Clone, FromRow)]
pub struct PendingEntryRow {
    pub id: DbId,
    pub event_name: String,
    pub event_date: Date,
    pub hours_awarded: f64,
}

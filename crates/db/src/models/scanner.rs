//! Scanner (volunteer) entity, DTOs and per-scanner summaries.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tiketon_core::types::{Date, DbId, Timestamp};
use validator::Validate;

/// A row from the `scanners` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Scanner {
    pub id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub telegram_id: Option<String>,
    /// Hours already cashed out into issued certificates. Never decremented.
    pub total_certificate_hours: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering a scanner.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateScanner {
    #[validate(length(min = 1, max = 64))]
    pub first_name: String,
    #[validate(length(min = 1, max = 64))]
    pub last_name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub telegram_id: Option<String>,
}

/// DTO for updating contact details. `total_certificate_hours` is not
/// editable here; only certificate issuance changes it.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateScanner {
    #[validate(length(min = 1, max = 64))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub telegram_id: Option<String>,
}

/// One participation of a scanner, joined with its event.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScannerParticipation {
    pub participant_id: DbId,
    pub event_id: DbId,
    pub event_name: String,
    pub event_date: Date,
    pub hours_awarded: f64,
}

/// Everything a leader sees before issuing an aggregate certificate.
#[derive(Debug, Clone, Serialize)]
pub struct ScannerSummary {
    pub scanner: Scanner,
    /// Sum of pending `hours_awarded` across all participations.
    pub current_hours: f64,
    pub participations: Vec<ScannerParticipation>,
}

impl ScannerSummary {
    pub fn new(scanner: Scanner, participations: Vec<ScannerParticipation>) -> Self {
        let current_hours = participations.iter().map(|p| p.hours_awarded).sum();
        Self {
            scanner,
            current_hours,
            participations,
        }
    }
}

//! User entity (admins and team leaders) and registration DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tiketon_core::types::{DbId, Timestamp};
use validator::Validate;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub telegram_id: Option<String>,
    pub role: String,
    /// The scanner record this user participates as, if any.
    pub scanner_id: Option<DbId>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Insert DTO used by the repository once the scanner link is resolved.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub telegram_id: Option<String>,
    pub role: String,
    pub scanner_id: Option<DbId>,
}

/// Request body for registering a team leader.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterTeamLeader {
    #[validate(length(min = 1, max = 64))]
    pub first_name: String,
    #[validate(length(min = 1, max = 64))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 64))]
    pub telegram_id: Option<String>,
}

/// A registered team leader together with the scanner record it is linked to.
#[derive(Debug, Clone, Serialize)]
pub struct TeamLeaderRegistration {
    pub user: User,
    pub scanner_id: DbId,
    /// False when an existing scanner was reused.
    pub scanner_created: bool,
}

/// Contact details of a notification recipient.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserContact {
    pub id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub telegram_id: Option<String>,
    pub is_active: bool,
}

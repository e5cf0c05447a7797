//! Notification audit log entity and DTOs.
//!
//! Rows are append-only: there is no update DTO.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tiketon_core::types::{DbId, Timestamp};

/// A row from the `notification_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationLog {
    pub id: DbId,
    /// The address actually used (chat id or email), or the best known
    /// contact when nothing could be attempted.
    pub recipient: String,
    pub recipient_email: Option<String>,
    pub recipient_telegram_id: Option<String>,
    pub channel: String,
    pub subject: String,
    pub message: String,
    pub is_test: bool,
    pub delivered: bool,
    pub error: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for inserting a log row.
#[derive(Debug, Clone)]
pub struct CreateNotificationLog {
    pub recipient: String,
    pub recipient_email: Option<String>,
    pub recipient_telegram_id: Option<String>,
    pub channel: String,
    pub subject: String,
    pub message: String,
    pub is_test: bool,
    pub delivered: bool,
    pub error: Option<String>,
}

/// Filters for listing the log.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationLogQuery {
    pub channel: Option<String>,
    pub delivered: Option<bool>,
    pub is_test: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

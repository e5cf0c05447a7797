//! The `purge_settings` singleton.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tiketon_core::retention::PurgePolicy;
use tiketon_core::types::{Date, Timestamp};
use validator::Validate;

/// The single row of `purge_settings`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PurgeSettings {
    pub purge_date: Option<Date>,
    pub notification_days_before: i32,
    pub is_active: bool,
    pub updated_at: Timestamp,
}

impl PurgeSettings {
    pub fn policy(&self) -> PurgePolicy {
        PurgePolicy {
            notification_days_before: self.notification_days_before,
            active: self.is_active,
            purge_date: self.purge_date,
            from_defaults: false,
        }
    }
}

/// Full replacement of the settings row.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpsertPurgeSettings {
    pub purge_date: Option<Date>,
    #[validate(range(min = 0, max = 365))]
    pub notification_days_before: i32,
    pub is_active: bool,
}

//! Repository for the `purge_settings` singleton.
//!
//! The table holds at most one row (boolean primary key pinned to `TRUE`).
//! Writes are a single `INSERT ... ON CONFLICT DO UPDATE`, so concurrent
//! admins never observe zero or two rows.

use sqlx::PgPool;
use tiketon_core::retention::PurgePolicy;

use crate::models::purge_settings::{PurgeSettings, UpsertPurgeSettings};

const COLUMNS: &str = "purge_date, notification_days_before, is_active, updated_at";

/// Single accessor for purge settings.
pub struct PurgeSettingsRepo;

impl PurgeSettingsRepo {
    /// The stored settings, if an admin has saved any.
    pub async fn get(pool: &PgPool) -> Result<Option<PurgeSettings>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM purge_settings WHERE id");
        sqlx::query_as::<_, PurgeSettings>(&query)
            .fetch_optional(pool)
            .await
    }

    /// The policy in effect: stored settings, or defaults when none exist.
    pub async fn effective_policy(pool: &PgPool) -> Result<PurgePolicy, sqlx::Error> {
        Ok(Self::get(pool)
            .await?
            .map(|settings| settings.policy())
            .unwrap_or_else(PurgePolicy::defaults))
    }

    /// Create or replace the settings row.
    pub async fn upsert(
        pool: &PgPool,
        input: &UpsertPurgeSettings,
    ) -> Result<PurgeSettings, sqlx::Error> {
        let query = format!(
            "INSERT INTO purge_settings (id, purge_date, notification_days_before, is_active) \
             VALUES (TRUE, $1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET \
                purge_date = EXCLUDED.purge_date, \
                notification_days_before = EXCLUDED.notification_days_before, \
                is_active = EXCLUDED.is_active, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PurgeSettings>(&query)
            .bind(input.purge_date)
            .bind(input.notification_days_before)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }
}

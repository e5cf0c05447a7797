//! Repository for the append-only `notification_logs` table.

use sqlx::PgPool;

use crate::models::notification_log::{CreateNotificationLog, NotificationLog, NotificationLogQuery};

/// Column list for `notification_logs` queries.
const COLUMNS: &str = "id, recipient, recipient_email, recipient_telegram_id, channel, \
    subject, message, is_test, delivered, error, created_at";

/// Filter clause shared by `list` and `count`.
const FILTER: &str = "WHERE ($1::TEXT IS NULL OR channel = $1) \
    AND ($2::BOOLEAN IS NULL OR delivered = $2) \
    AND ($3::BOOLEAN IS NULL OR is_test = $3)";

/// Provides insert and query operations for the notification log.
pub struct NotificationLogRepo;

impl NotificationLogRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateNotificationLog,
    ) -> Result<NotificationLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO notification_logs \
                (recipient, recipient_email, recipient_telegram_id, channel, subject, \
                 message, is_test, delivered, error) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NotificationLog>(&query)
            .bind(&input.recipient)
            .bind(&input.recipient_email)
            .bind(&input.recipient_telegram_id)
            .bind(&input.channel)
            .bind(&input.subject)
            .bind(&input.message)
            .bind(input.is_test)
            .bind(input.delivered)
            .bind(&input.error)
            .fetch_one(pool)
            .await
    }

    /// List log rows newest first.
    pub async fn list(
        pool: &PgPool,
        params: &NotificationLogQuery,
    ) -> Result<Vec<NotificationLog>, sqlx::Error> {
        let limit = params.limit.unwrap_or(50).clamp(1, 500);
        let offset = params.offset.unwrap_or(0).max(0);
        let query = format!(
            "SELECT {COLUMNS} FROM notification_logs {FILTER} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, NotificationLog>(&query)
            .bind(&params.channel)
            .bind(params.delivered)
            .bind(params.is_test)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count log rows matching the same filters as [`Self::list`].
    pub async fn count(pool: &PgPool, params: &NotificationLogQuery) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*)::BIGINT FROM notification_logs {FILTER}");
        sqlx::query_scalar::<_, i64>(&query)
            .bind(&params.channel)
            .bind(params.delivered)
            .bind(params.is_test)
            .fetch_one(pool)
            .await
    }
}

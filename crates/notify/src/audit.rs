//! Where the dispatcher writes its audit rows.

use async_trait::async_trait;
use sqlx::PgPool;
use tiketon_core::types::DbId;
use tiketon_db::models::notification_log::CreateNotificationLog;
use tiketon_db::repositories::NotificationLogRepo;

/// Append-only sink for notification outcomes.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: CreateNotificationLog) -> Result<DbId, sqlx::Error>;
}

/// Writes audit rows to the `notification_logs` table.
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn record(&self, entry: CreateNotificationLog) -> Result<DbId, sqlx::Error> {
        NotificationLogRepo::create(&self.pool, &entry)
            .await
            .map(|log| log.id)
    }
}

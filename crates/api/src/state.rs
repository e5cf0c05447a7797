use std::sync::Arc;

use tiketon_notify::NotificationDispatcher;
use tiketon_worker::PurgeEngine;

use crate::certificates::CertificateRenderer;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: tiketon_db::DbPool,
    /// Server configuration, including the hour-accrual policy.
    pub config: Arc<ServerConfig>,
    /// Chat/email dispatcher used for test notifications.
    pub dispatcher: NotificationDispatcher,
    /// Purge engine used for dry-run previews.
    pub purge: PurgeEngine,
    /// Certificate artifact renderer.
    pub renderer: Arc<dyn CertificateRenderer>,
}

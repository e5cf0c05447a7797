//! Retention purge engine.
//!
//! One [`PurgeEngine::run`] call is one stateless pass:
//!
//! 1. Read the effective [`PurgePolicy`] (stored settings or defaults) and
//!    stop early if the policy says this run should not happen.
//! 2. Classify events against the [`RetentionWindow`] for `today`.
//! 3. Send each creator one consolidated warning about their events in the
//!    warning window.
//! 4. Delete expired events (cascading to their ledger entries) and send
//!    the administrators one summary of how many were removed.
//!
//! Only failing to read settings or events, or the delete itself, aborts the
//! run. Notification failures are counted in the report and never roll back
//! deletion. A dry run builds the same report without side effects.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;
use tiketon_core::retention::{
    deletion_summary, group_by_creator, skip_reason, warning_message, PurgeMode, PurgePolicy,
    RetentionWindow, SkipReason, WarnedEvent, DELETION_SUBJECT, WARNING_SUBJECT,
};
use tiketon_core::types::{Date, DbId};
use tiketon_db::models::event::RetentionEvent;
use tiketon_db::models::user::UserContact;
use tiketon_db::repositories::{EventRepo, PurgeSettingsRepo, UserRepo};
use tiketon_notify::{DeliveryReceipt, DispatchError, NotificationDispatcher, OutgoingMessage, Recipient};

/// Display name recorded for the deletion summary.
const ADMIN_RECIPIENT: &str = "administrators";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Failures that abort a purge run.
#[derive(Debug, thiserror::Error)]
pub enum PurgeError {
    #[error("Failed to read purge settings: {0}")]
    Settings(#[source] sqlx::Error),

    #[error("Failed to read events: {0}")]
    Events(#[source] sqlx::Error),

    #[error("Failed to delete expired events: {0}")]
    Delete(#[source] sqlx::Error),
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// An event that is (or would be) deleted by this run.
#[derive(Debug, Clone, Serialize)]
pub struct ExpiringEvent {
    pub id: DbId,
    pub name: String,
    pub date: Date,
    pub created_by: DbId,
    pub creator_name: String,
}

/// Result of one dispatch, as shown in the report.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchSummary {
    pub delivered: bool,
    pub channel: Option<&'static str>,
    pub error: Option<String>,
}

impl DispatchSummary {
    fn from_result(result: &Result<DeliveryReceipt, DispatchError>) -> Self {
        match result {
            Ok(receipt) => Self {
                delivered: true,
                channel: Some(receipt.channel),
                error: None,
            },
            Err(e) => Self {
                delivered: false,
                channel: match e {
                    DispatchError::Failed { channel, .. } => Some(*channel),
                    DispatchError::Unreachable { .. } => None,
                },
                error: Some(e.to_string()),
            },
        }
    }
}

/// The consolidated warning for one event creator.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderWarning {
    pub leader_id: DbId,
    pub leader_name: String,
    pub email: String,
    pub telegram_id: Option<String>,
    pub events: Vec<WarnedEvent>,
    /// `None` when no notification was sent (dry run).
    pub dispatch: Option<DispatchSummary>,
}

/// Admin summary dispatch result.
#[derive(Debug, Clone, Serialize)]
pub struct AdminNotice {
    pub recipient: String,
    pub dispatch: DispatchSummary,
}

/// Sent/failed notification counters.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NotificationTally {
    pub sent: usize,
    pub failed: usize,
}

impl NotificationTally {
    fn count(&mut self, summary: &DispatchSummary) {
        if summary.delivered {
            self.sent += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Everything one run found and did.
#[derive(Debug, Clone, Serialize)]
pub struct PurgeReport {
    pub mode: &'static str,
    pub policy: PurgePolicy,
    pub window: RetentionWindow,
    /// Set when the run did nothing because of the policy.
    pub skipped: Option<SkipReason>,
    pub expiring: Vec<ExpiringEvent>,
    pub warnings: Vec<LeaderWarning>,
    /// At most one per run, whatever the number of admins.
    pub admin_notice: Option<AdminNotice>,
    pub notifications: NotificationTally,
    pub deleted: u64,
}

impl PurgeReport {
    fn new(mode: PurgeMode, policy: PurgePolicy, window: RetentionWindow) -> Self {
        Self {
            mode: mode.label(),
            policy,
            window,
            skipped: None,
            expiring: Vec::new(),
            warnings: Vec::new(),
            admin_notice: None,
            notifications: NotificationTally::default(),
            deleted: 0,
        }
    }

    /// Total number of events that get a warning.
    pub fn warned_event_count(&self) -> usize {
        self.warnings.iter().map(|w| w.events.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Runs retention purges against the database and dispatcher.
#[derive(Clone)]
pub struct PurgeEngine {
    pool: PgPool,
    dispatcher: NotificationDispatcher,
}

impl PurgeEngine {
    pub fn new(pool: PgPool, dispatcher: NotificationDispatcher) -> Self {
        Self { pool, dispatcher }
    }

    /// Execute one purge pass for `today` in the given mode.
    pub async fn run(&self, today: NaiveDate, mode: PurgeMode) -> Result<PurgeReport, PurgeError> {
        let policy = PurgeSettingsRepo::effective_policy(&self.pool)
            .await
            .map_err(PurgeError::Settings)?;
        if policy.from_defaults {
            tracing::info!("No purge settings stored, using defaults");
        }

        let window = RetentionWindow::new(today, policy.notification_days_before);
        let mut report = PurgeReport::new(mode, policy, window);

        if let Some(reason) = skip_reason(&report.policy, mode, today) {
            tracing::info!(?reason, mode = mode.label(), "Purge run skipped");
            report.skipped = Some(reason);
            return Ok(report);
        }

        tracing::info!(
            mode = mode.label(),
            %today,
            cutoff = %window.cutoff,
            warning_until = %window.warning_until,
            "Purge run started"
        );

        let expiring = EventRepo::list_dated_before(&self.pool, window.cutoff)
            .await
            .map_err(PurgeError::Events)?;
        let warned = EventRepo::list_dated_between(&self.pool, window.cutoff, window.warning_until)
            .await
            .map_err(PurgeError::Events)?;

        report.expiring = expiring
            .iter()
            .map(|e| ExpiringEvent {
                id: e.id,
                name: e.name.clone(),
                date: e.date,
                created_by: e.created_by,
                creator_name: e.creator_name(),
            })
            .collect();
        report.warnings = build_warnings(&warned);

        if mode.sends_notifications() {
            self.send_warnings(&mut report).await;
        }

        if mode.deletes() && !report.expiring.is_empty() {
            let ids: Vec<DbId> = report.expiring.iter().map(|e| e.id).collect();
            report.deleted = EventRepo::delete_many(&self.pool, &ids)
                .await
                .map_err(PurgeError::Delete)?;
            tracing::info!(deleted = report.deleted, cutoff = %window.cutoff, "Expired events deleted");
            self.notify_admins(&mut report).await;
        }

        tracing::info!(
            mode = report.mode,
            expiring = report.expiring.len(),
            warned_events = report.warned_event_count(),
            leaders = report.warnings.len(),
            sent = report.notifications.sent,
            failed = report.notifications.failed,
            deleted = report.deleted,
            "Purge run finished"
        );
        Ok(report)
    }

    async fn send_warnings(&self, report: &mut PurgeReport) {
        let days = report.policy.notification_days_before;
        for warning in &mut report.warnings {
            let recipient = Recipient {
                display_name: warning.leader_name.clone(),
                email: Some(warning.email.clone()),
                chat_id: warning.telegram_id.clone(),
            };
            let message = OutgoingMessage::new(
                WARNING_SUBJECT,
                warning_message(&warning.leader_name, days, &warning.events),
            );

            let result = self.dispatcher.send(&recipient, &message).await;
            if let Err(e) = &result {
                tracing::warn!(leader_id = warning.leader_id, error = %e, "Purge warning not delivered");
            }
            let summary = DispatchSummary::from_result(&result);
            report.notifications.count(&summary);
            warning.dispatch = Some(summary);
        }
    }

    async fn notify_admins(&self, report: &mut PurgeReport) {
        let message = OutgoingMessage::new(
            DELETION_SUBJECT,
            deletion_summary(report.deleted, report.window.cutoff),
        );

        let admins = match UserRepo::list_active_admins(&self.pool).await {
            Ok(admins) => admins,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load admin recipients, summary not sent");
                report.notifications.failed += 1;
                return;
            }
        };

        if admins.is_empty() {
            tracing::warn!("No active admin to receive the deletion summary");
        }
        let recipient = admin_recipient(&admins);

        let result = self.dispatcher.send(&recipient, &message).await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Deletion summary not delivered");
        }
        let summary = DispatchSummary::from_result(&result);
        report.notifications.count(&summary);
        report.admin_notice = Some(AdminNotice {
            recipient: recipient.display_name,
            dispatch: summary,
        });
    }
}

/// The single audited recipient for the deletion summary.
///
/// Chat goes to the first admin (by id) with a Telegram id, email to the
/// first admin. With no admins both are empty, so the dispatch is still
/// audited as undeliverable.
fn admin_recipient(admins: &[UserContact]) -> Recipient {
    Recipient {
        display_name: ADMIN_RECIPIENT.to_string(),
        email: admins.first().map(|a| a.email.clone()),
        chat_id: admins.iter().find_map(|a| a.telegram_id.clone()),
    }
}

/// Group warned events by creator, keeping each creator's contact details.
fn build_warnings(events: &[RetentionEvent]) -> Vec<LeaderWarning> {
    let contacts: HashMap<DbId, &RetentionEvent> =
        events.iter().map(|e| (e.created_by, e)).collect();

    let warned = events.iter().map(|e| WarnedEvent {
        event_id: e.id,
        name: e.name.clone(),
        date: e.date,
        created_by: e.created_by,
    });

    group_by_creator(warned)
        .into_iter()
        .filter_map(|(leader_id, events)| {
            let contact = contacts.get(&leader_id)?;
            Some(LeaderWarning {
                leader_id,
                leader_name: contact.creator_name(),
                email: contact.creator_email.clone(),
                telegram_id: contact.creator_telegram_id.clone(),
                events,
                dispatch: None,
            })
        })
        .collect()
}

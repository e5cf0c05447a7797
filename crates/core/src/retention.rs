//! One-year event retention rules.
//!
//! A purge run looks at every event relative to `today`:
//!
//! ```text
//!   cutoff = today - 365 days
//!   date <  cutoff                                   -> Expiring (deleted this run)
//!   cutoff <= date <= cutoff + notification_days     -> Warning  (creator is notified)
//!   date >  cutoff + notification_days               -> Retained
//! ```
//!
//! Everything here is pure; the worker crate reads events and settings,
//! classifies them with [`RetentionWindow`] and hands the composed messages
//! to the notification dispatcher.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::certificate::format_date;
use crate::error::CoreError;
use crate::types::DbId;

/// Events are kept for this many days after their date.
pub const RETENTION_DAYS: i64 = 365;

/// Lead time used when no purge settings row exists.
pub const DEFAULT_NOTIFICATION_DAYS_BEFORE: i32 = 7;

/// Upper bound accepted for the notification lead time.
pub const MAX_NOTIFICATION_DAYS_BEFORE: i32 = 365;

/// Subject line of the advance warning sent to event creators.
pub const WARNING_SUBJECT: &str = "Important: your events are about to be deleted";

/// Subject line of the deletion summary sent to administrators.
pub const DELETION_SUBJECT: &str = "Notice: expired events deleted";

// ---------------------------------------------------------------------------
// Policy and mode
// ---------------------------------------------------------------------------

/// The purge settings in effect for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurgePolicy {
    pub notification_days_before: i32,
    pub active: bool,
    /// Automatic purging does not start before this date.
    pub purge_date: Option<NaiveDate>,
    /// True when no settings row existed and defaults were used.
    pub from_defaults: bool,
}

impl PurgePolicy {
    pub fn defaults() -> Self {
        Self {
            notification_days_before: DEFAULT_NOTIFICATION_DAYS_BEFORE,
            active: true,
            purge_date: None,
            from_defaults: true,
        }
    }
}

/// Orthogonal run flags from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeMode {
    /// Compute and report only: no notifications, no deletion.
    pub dry_run: bool,
    /// Send warnings but skip deletion.
    pub notify_only: bool,
}

impl PurgeMode {
    pub const NORMAL: Self = Self {
        dry_run: false,
        notify_only: false,
    };

    pub const DRY_RUN: Self = Self {
        dry_run: true,
        notify_only: false,
    };

    pub const NOTIFY_ONLY: Self = Self {
        dry_run: false,
        notify_only: true,
    };

    pub fn sends_notifications(self) -> bool {
        !self.dry_run
    }

    pub fn deletes(self) -> bool {
        !self.dry_run && !self.notify_only
    }

    /// Explicit flags bypass the `active` switch.
    pub fn is_override(self) -> bool {
        self.dry_run || self.notify_only
    }

    pub fn label(self) -> &'static str {
        match (self.dry_run, self.notify_only) {
            (true, _) => "dry_run",
            (false, true) => "notify_only",
            (false, false) => "normal",
        }
    }
}

/// Why a run did nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// `active = false` and no override flag was given.
    Inactive,
    /// Automatic purging has not started yet.
    NotStarted { purge_date: NaiveDate },
}

/// Decide whether a run should be a no-op.
pub fn skip_reason(policy: &PurgePolicy, mode: PurgeMode, today: NaiveDate) -> Option<SkipReason> {
    if mode.is_override() {
        return None;
    }
    if !policy.active {
        return Some(SkipReason::Inactive);
    }
    match policy.purge_date {
        Some(purge_date) if today < purge_date => Some(SkipReason::NotStarted { purge_date }),
        _ => None,
    }
}

/// Validate an admin-submitted notification lead time.
pub fn validate_notification_days(days: i32) -> Result<i32, CoreError> {
    if !(0..=MAX_NOTIFICATION_DAYS_BEFORE).contains(&days) {
        return Err(CoreError::Validation(format!(
            "notification_days_before must be between 0 and {MAX_NOTIFICATION_DAYS_BEFORE}, got {days}"
        )));
    }
    Ok(days)
}

// ---------------------------------------------------------------------------
// Window
// ---------------------------------------------------------------------------

/// Where an event falls relative to the retention window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionClass {
    Expiring,
    Warning,
    Retained,
}

/// Date boundaries of one purge run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetentionWindow {
    pub today: NaiveDate,
    /// Events dated strictly before this are expired.
    pub cutoff: NaiveDate,
    /// Events dated in `[cutoff, warning_until]` get an advance warning.
    pub warning_until: NaiveDate,
}

impl RetentionWindow {
    pub fn new(today: NaiveDate, notification_days_before: i32) -> Self {
        let cutoff = today - Duration::days(RETENTION_DAYS);
        let lead = i64::from(notification_days_before.max(0));
        Self {
            today,
            cutoff,
            warning_until: cutoff + Duration::days(lead),
        }
    }

    pub fn classify(&self, event_date: NaiveDate) -> RetentionClass {
        if event_date < self.cutoff {
            RetentionClass::Expiring
        } else if event_date <= self.warning_until {
            RetentionClass::Warning
        } else {
            RetentionClass::Retained
        }
    }

    /// The first daily run that will delete an event dated `event_date`.
    pub fn deletion_date(event_date: NaiveDate) -> NaiveDate {
        event_date + Duration::days(RETENTION_DAYS + 1)
    }
}

// ---------------------------------------------------------------------------
// Warning grouping and messages
// ---------------------------------------------------------------------------

/// An event included in an advance warning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarnedEvent {
    pub event_id: DbId,
    pub name: String,
    pub date: NaiveDate,
    pub created_by: DbId,
}

/// Group warned events by creator, ordered by creator id then event date.
pub fn group_by_creator(events: impl IntoIterator<Item = WarnedEvent>) -> Vec<(DbId, Vec<WarnedEvent>)> {
    let mut grouped: BTreeMap<DbId, Vec<WarnedEvent>> = BTreeMap::new();
    for event in events {
        grouped.entry(event.created_by).or_default().push(event);
    }
    grouped
        .into_iter()
        .map(|(leader, mut events)| {
            events.sort_by_key(|e| (e.date, e.event_id));
            (leader, events)
        })
        .collect()
}

/// Consolidated advance warning for one event creator.
pub fn warning_message(leader_name: &str, notification_days_before: i32, events: &[WarnedEvent]) -> String {
    let list = events
        .iter()
        .map(|e| {
            format!(
                "- {} ({}), deleted on {}",
                e.name,
                format_date(e.date),
                format_date(RetentionWindow::deletion_date(e.date))
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Hello, {leader_name}!\n\n\
         The following events you created will be deleted automatically within \
         {notification_days_before} days:\n\n\
         {list}\n\n\
         Events are kept for one year under the data retention policy. \
         If you need their data, please export it before the deletion date.\n\n\
         Regards,\nTiketon team"
    )
}

/// Summary sent to administrators after a deletion run.
pub fn deletion_summary(deleted: u64, cutoff: NaiveDate) -> String {
    format!(
        "Deleted {deleted} events dated before {}.",
        format_date(cutoff)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn days_ago(today: NaiveDate, n: i64) -> NaiveDate {
        today - Duration::days(n)
    }

    #[test]
    fn window_boundaries() {
        let today = date(2026, 3, 1);
        let window = RetentionWindow::new(today, 7);
        assert_eq!(window.cutoff, days_ago(today, 365));
        assert_eq!(window.warning_until, days_ago(today, 358));
    }

    #[test]
    fn classify_old_event_as_expiring_not_warning() {
        let today = date(2026, 3, 1);
        let window = RetentionWindow::new(today, 7);
        assert_eq!(window.classify(days_ago(today, 400)), RetentionClass::Expiring);
        assert_eq!(window.classify(days_ago(today, 366)), RetentionClass::Expiring);
    }

    #[test]
    fn classify_warning_window_is_inclusive() {
        let today = date(2026, 3, 1);
        let window = RetentionWindow::new(today, 7);
        assert_eq!(window.classify(days_ago(today, 365)), RetentionClass::Warning);
        assert_eq!(window.classify(days_ago(today, 360)), RetentionClass::Warning);
        assert_eq!(window.classify(days_ago(today, 358)), RetentionClass::Warning);
        assert_eq!(window.classify(days_ago(today, 357)), RetentionClass::Retained);
        assert_eq!(window.classify(today), RetentionClass::Retained);
    }

    #[test]
    fn zero_lead_time_warns_only_on_cutoff_day() {
        let today = date(2026, 3, 1);
        let window = RetentionWindow::new(today, 0);
        assert_eq!(window.classify(window.cutoff), RetentionClass::Warning);
        assert_eq!(
            window.classify(window.cutoff + Duration::days(1)),
            RetentionClass::Retained
        );
    }

    #[test]
    fn deletion_date_is_first_run_past_cutoff() {
        let event_date = date(2025, 3, 1);
        let deletion = RetentionWindow::deletion_date(event_date);
        assert_eq!(
            RetentionWindow::new(deletion, 7).classify(event_date),
            RetentionClass::Expiring
        );
        assert_eq!(
            RetentionWindow::new(deletion - Duration::days(1), 7).classify(event_date),
            RetentionClass::Warning
        );
    }

    #[test]
    fn inactive_policy_skips_normal_runs_only() {
        let today = date(2026, 3, 1);
        let policy = PurgePolicy {
            active: false,
            ..PurgePolicy::defaults()
        };
        assert_eq!(
            skip_reason(&policy, PurgeMode::NORMAL, today),
            Some(SkipReason::Inactive)
        );
        assert_eq!(skip_reason(&policy, PurgeMode::DRY_RUN, today), None);
        assert_eq!(skip_reason(&policy, PurgeMode::NOTIFY_ONLY, today), None);
    }

    #[test]
    fn purge_date_delays_start() {
        let today = date(2026, 3, 1);
        let policy = PurgePolicy {
            purge_date: Some(date(2026, 3, 2)),
            ..PurgePolicy::defaults()
        };
        assert_eq!(
            skip_reason(&policy, PurgeMode::NORMAL, today),
            Some(SkipReason::NotStarted {
                purge_date: date(2026, 3, 2)
            })
        );
        assert_eq!(skip_reason(&policy, PurgeMode::NORMAL, date(2026, 3, 2)), None);
    }

    #[test]
    fn modes() {
        assert!(PurgeMode::NORMAL.deletes() && PurgeMode::NORMAL.sends_notifications());
        assert!(!PurgeMode::DRY_RUN.deletes() && !PurgeMode::DRY_RUN.sends_notifications());
        assert!(!PurgeMode::NOTIFY_ONLY.deletes() && PurgeMode::NOTIFY_ONLY.sends_notifications());
        let both = PurgeMode {
            dry_run: true,
            notify_only: true,
        };
        assert!(!both.deletes() && !both.sends_notifications());
        assert_eq!(both.label(), "dry_run");
    }

    #[test]
    fn grouping_by_creator() {
        let events = vec![
            WarnedEvent {
                event_id: 1,
                name: "B".into(),
                date: date(2025, 3, 5),
                created_by: 20,
            },
            WarnedEvent {
                event_id: 2,
                name: "A".into(),
                date: date(2025, 3, 3),
                created_by: 10,
            },
            WarnedEvent {
                event_id: 3,
                name: "C".into(),
                date: date(2025, 3, 1),
                created_by: 20,
            },
        ];
        let grouped = group_by_creator(events);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].0, 10);
        assert_eq!(grouped[1].0, 20);
        let ids: Vec<_> = grouped[1].1.iter().map(|e| e.event_id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn warning_message_lists_every_event() {
        let events = vec![WarnedEvent {
            event_id: 1,
            name: "Jazz Night".into(),
            date: date(2025, 3, 5),
            created_by: 1,
        }];
        let msg = warning_message("Aida Serikova", 7, &events);
        assert!(msg.contains("Hello, Aida Serikova!"));
        assert!(msg.contains("- Jazz Night (05.03.2025), deleted on 06.03.2026"));
        assert!(msg.contains("within 7 days"));
    }

    #[test]
    fn summary_mentions_count_and_cutoff() {
        assert_eq!(
            deletion_summary(3, date(2025, 3, 1)),
            "Deleted 3 events dated before 01.03.2025."
        );
    }

    #[test]
    fn notification_days_validation() {
        assert_eq!(validate_notification_days(7).unwrap(), 7);
        assert!(validate_notification_days(-1).is_err());
        assert!(validate_notification_days(366).is_err());
    }
}

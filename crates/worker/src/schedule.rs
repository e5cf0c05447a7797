//! Daily scheduling of the purge for `tiketon-worker --daemon`.

use std::time::Duration;

use chrono::{DateTime, Days, NaiveTime, Utc};
use tiketon_core::retention::PurgeMode;
use tokio_util::sync::CancellationToken;

use crate::purge::PurgeEngine;

/// Default hour of day (UTC) for the daily run.
pub const DEFAULT_RUN_HOUR: u32 = 2;

/// Read `PURGE_RUN_HOUR` (0-23), falling back to [`DEFAULT_RUN_HOUR`].
pub fn run_hour_from_env() -> u32 {
    std::env::var("PURGE_RUN_HOUR")
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|h| *h < 24)
        .unwrap_or(DEFAULT_RUN_HOUR)
}

/// The first `hour:00` UTC strictly after `now`.
pub fn next_run_after(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let at = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        now.date_naive()
            .checked_add_days(Days::new(1))
            .map(|d| d.and_time(at).and_utc())
            .unwrap_or(today)
    }
}

/// Run the purge every day at `hour` UTC until `cancel` is triggered.
///
/// A failed run is logged and retried the next day; the loop itself never
/// exits on error.
pub async fn run_daily(engine: PurgeEngine, hour: u32, cancel: CancellationToken) {
    tracing::info!(hour, "Daily purge scheduler started");

    loop {
        let now = Utc::now();
        let next = next_run_after(now, hour);
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        tracing::info!(next_run = %next, "Next purge scheduled");

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Daily purge scheduler stopping");
                break;
            }
            _ = tokio::time::sleep(wait) => {
                match engine.run(next.date_naive(), PurgeMode::NORMAL).await {
                    Ok(report) => tracing::info!(
                        deleted = report.deleted,
                        warned_events = report.warned_event_count(),
                        skipped = report.skipped.is_some(),
                        "Scheduled purge completed"
                    ),
                    Err(e) => tracing::error!(error = %e, "Scheduled purge failed"),
                }
            }
        }
    }
}

use std::process::ExitCode;

use chrono::{NaiveDate, Utc};
use clap::Parser;
use tiketon_core::retention::PurgeMode;
use tiketon_notify::NotificationDispatcher;
use tiketon_worker::purge::{PurgeEngine, PurgeReport};
use tiketon_worker::schedule;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Delete events older than one year, warning their creators in advance.
#[derive(Debug, Parser)]
#[command(name = "tiketon-worker", version)]
struct Cli {
    /// Compute and print what would happen; send nothing, delete nothing.
    #[arg(long)]
    dry_run: bool,

    /// Send advance warnings but skip deletion.
    #[arg(long)]
    notify_only: bool,

    /// Keep running and purge once a day at PURGE_RUN_HOUR (UTC).
    #[arg(long, conflicts_with_all = ["dry_run", "notify_only", "today"])]
    daemon: bool,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,

    /// Run as if today were this date (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    today: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tiketon_worker=info,tiketon_notify=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = tiketon_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tiketon_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // --- Notifications ---
    let dispatcher =
        NotificationDispatcher::from_env(pool.clone()).expect("Failed to build notification channels");
    let engine = PurgeEngine::new(pool, dispatcher);

    if cli.daemon {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(schedule::run_daily(
            engine,
            schedule::run_hour_from_env(),
            cancel.clone(),
        ));
        shutdown_signal().await;
        cancel.cancel();
        let _ = handle.await;
        tracing::info!("Worker stopped");
        return ExitCode::SUCCESS;
    }

    let mode = PurgeMode {
        dry_run: cli.dry_run,
        notify_only: cli.notify_only,
    };
    let today = cli.today.unwrap_or_else(|| Utc::now().date_naive());

    match engine.run(today, mode).await {
        Ok(report) => {
            if cli.json {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{json}"),
                    Err(e) => tracing::error!(error = %e, "Failed to serialize report"),
                }
            } else {
                print_summary(&report);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Purge aborted");
            ExitCode::FAILURE
        }
    }
}

fn print_summary(report: &PurgeReport) {
    println!(
        "mode: {}  cutoff: {}  warning until: {}",
        report.mode, report.window.cutoff, report.window.warning_until
    );
    if let Some(reason) = &report.skipped {
        println!("skipped: {reason:?}");
        return;
    }
    println!("expiring events: {}", report.expiring.len());
    for event in &report.expiring {
        println!("  - #{} {} ({}) by {}", event.id, event.name, event.date, event.creator_name);
    }
    println!(
        "warning notices: {} events for {} leaders",
        report.warned_event_count(),
        report.warnings.len()
    );
    for warning in &report.warnings {
        let status = match &warning.dispatch {
            None => "not sent".to_string(),
            Some(d) if d.delivered => format!("sent via {}", d.channel.unwrap_or("?")),
            Some(d) => format!("failed: {}", d.error.as_deref().unwrap_or("unknown error")),
        };
        println!("  - {} ({} events): {status}", warning.leader_name, warning.events.len());
    }
    println!(
        "notifications sent: {}  failed: {}  deleted: {}",
        report.notifications.sent, report.notifications.failed, report.deleted
    );
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, stopping"),
        () = terminate => tracing::info!("Received SIGTERM, stopping"),
    }
}

pub mod admin;
pub mod events;
pub mod health;
pub mod scanners;

use axum::routing::post;
use axum::Router;

use crate::handlers::certificates;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /events/...                     events, participants, event certificates
/// /scanners/...                   volunteers, summaries, aggregate certificates
/// /certificates/scanners          aggregate certificates for everyone (zip, admin)
/// /admin/...                      users, team leaders, purge, notification log
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/events", events::router())
        .nest("/scanners", scanners::router())
        .route("/certificates/scanners", post(certificates::issue_all_scanners))
        .nest("/admin", admin::router())
}

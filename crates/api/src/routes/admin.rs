//! Route definitions for `/admin`. Every handler requires the admin role.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::{notifications, purge, users};
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET    /users                    -> list_users
/// PATCH  /users/{id}               -> set_active
/// POST   /team-leaders             -> register_team_leader
///
/// GET    /purge/settings           -> get_settings
/// PUT    /purge/settings           -> update_settings
/// GET    /purge/preview            -> preview (dry run)
///
/// GET    /notifications            -> list_logs
/// GET    /notifications/channels   -> channels
/// POST   /notifications/test       -> send_test
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(users::list_users))
        .route("/users/{id}", patch(users::set_active))
        .route("/team-leaders", post(users::register_team_leader))
        // Retention purge
        .route(
            "/purge/settings",
            get(purge::get_settings).put(purge::update_settings),
        )
        .route("/purge/preview", get(purge::preview))
        // Notification log
        .route("/notifications", get(notifications::list_logs))
        .route("/notifications/channels", get(notifications::channels))
        .route("/notifications/test", post(notifications::send_test))
}

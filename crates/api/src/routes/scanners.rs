//! Route definitions for the `/scanners` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{certificates, scanners};
use crate::state::AppState;

/// Routes mounted at `/scanners`.
///
/// ```text
/// GET    /                    -> list_scanners
/// POST   /                    -> create_scanner
/// GET    /{id}                -> get_scanner
/// PUT    /{id}                -> update_scanner
/// DELETE /{id}                -> delete_scanner (admin)
/// GET    /{id}/events         -> scanner_summary
/// POST   /{id}/certificate    -> issue_scanner
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(scanners::list_scanners).post(scanners::create_scanner))
        .route(
            "/{id}",
            get(scanners::get_scanner)
                .put(scanners::update_scanner)
                .delete(scanners::delete_scanner),
        )
        .route("/{id}/events", get(scanners::scanner_summary))
        .route("/{id}/certificate", post(certificates::issue_scanner))
}

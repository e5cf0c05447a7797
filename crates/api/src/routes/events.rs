//! Route definitions for the `/events` resource, including participants.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::{certificates, events, participants};
use crate::state::AppState;

/// Routes mounted at `/events`.
///
/// ```text
/// GET    /                                         -> list_events
/// POST   /                                         -> create_event
/// GET    /{id}                                     -> get_event
/// PUT    /{id}                                     -> update_event
/// DELETE /{id}                                     -> delete_event
/// PUT    /{id}/duration                            -> set_duration
/// POST   /{id}/recompute                           -> recompute
/// POST   /{id}/certificates                        -> issue_event_batch (zip)
///
/// GET    /{id}/participants                        -> list_participants
/// POST   /{id}/participants                        -> add_participant
/// POST   /{id}/participants/bulk                   -> bulk_add_participants
/// DELETE /{id}/participants/{pid}                  -> remove_participant
/// PUT    /{id}/participants/{pid}/lateness         -> set_lateness
/// POST   /{id}/participants/{pid}/certificate      -> issue_participation
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(events::list_events).post(events::create_event))
        .route(
            "/{id}",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/{id}/duration", put(events::set_duration))
        .route("/{id}/recompute", post(events::recompute))
        .route("/{id}/certificates", post(certificates::issue_event_batch))
        // Participants
        .route(
            "/{id}/participants",
            get(participants::list_participants).post(participants::add_participant),
        )
        .route(
            "/{id}/participants/bulk",
            post(participants::bulk_add_participants),
        )
        .route(
            "/{id}/participants/{participant_id}",
            delete(participants::remove_participant),
        )
        .route(
            "/{id}/participants/{participant_id}/lateness",
            put(participants::set_lateness),
        )
        .route(
            "/{id}/participants/{participant_id}/certificate",
            post(certificates::issue_participation),
        )
}

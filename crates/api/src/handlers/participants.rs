//! Handlers for `/events/{id}/participants`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tiketon_core::types::DbId;
use tiketon_db::models::participant::{
    AddParticipant, BulkAddParticipants, ParticipantListing, UpdateLateness,
};
use tiketon_db::repositories::ParticipantRepo;
use validator::Validate;

use crate::error::AppResult;
use crate::handlers::events::find_owned_event;
use crate::middleware::rbac::RequireLeader;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/events/{id}/participants
///
/// Each entry carries `hours_awarded` and its `H:MM` display form.
pub async fn list_participants(
    RequireLeader(user): RequireLeader,
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_owned_event(&state, &user, event_id).await?;
    let participants: Vec<ParticipantListing> = ParticipantRepo::list_for_event(&state.pool, event_id)
        .await?
        .into_iter()
        .map(ParticipantListing::from)
        .collect();
    Ok(Json(DataResponse { data: participants }))
}

/// POST /api/v1/events/{id}/participants
///
/// Fails with 409 when the scanner is already on the event or the event is
/// full.
pub async fn add_participant(
    RequireLeader(user): RequireLeader,
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
    Json(input): Json<AddParticipant>,
) -> AppResult<impl IntoResponse> {
    find_owned_event(&state, &user, event_id).await?;
    let participant = ParticipantRepo::add(&state.pool, event_id, input.scanner_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: participant })))
}

/// POST /api/v1/events/{id}/participants/bulk
///
/// Adds scanners until the event is full and reports which ids were added,
/// already present, or left out for capacity.
pub async fn bulk_add_participants(
    RequireLeader(user): RequireLeader,
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
    Json(input): Json<BulkAddParticipants>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    find_owned_event(&state, &user, event_id).await?;
    let outcome = ParticipantRepo::bulk_add(&state.pool, event_id, &input.scanner_ids).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// DELETE /api/v1/events/{id}/participants/{participant_id}
///
/// Idempotent: removing an unknown participant still returns 204.
pub async fn remove_participant(
    RequireLeader(user): RequireLeader,
    State(state): State<AppState>,
    Path((event_id, participant_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    find_owned_event(&state, &user, event_id).await?;
    ParticipantRepo::remove(&state.pool, event_id, participant_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/events/{id}/participants/{participant_id}/lateness
///
/// Records lateness only; hours change on the next duration edit or
/// recompute.
pub async fn set_lateness(
    RequireLeader(user): RequireLeader,
    State(state): State<AppState>,
    Path((event_id, participant_id)): Path<(DbId, DbId)>,
    Json(input): Json<UpdateLateness>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    find_owned_event(&state, &user, event_id).await?;
    let participant =
        ParticipantRepo::set_lateness(&state.pool, event_id, participant_id, &input).await?;
    Ok(Json(DataResponse { data: participant }))
}

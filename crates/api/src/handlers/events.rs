//! Handlers for the `/events` resource.
//!
//! Team leaders manage the events they created; admins manage every event.
//! Duration changes go through the ledger so participant hours are
//! recomputed in the same transaction.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tiketon_core::error::CoreError;
use tiketon_core::types::DbId;
use tiketon_db::models::event::{CreateEvent, Event, UpdateEvent};
use tiketon_db::models::participant::SetDuration;
use tiketon_db::repositories::{EventRepo, ParticipantRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireLeader;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Load an event or fail with 404.
pub(crate) async fn find_event(state: &AppState, id: DbId) -> AppResult<Event> {
    EventRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "event", id }))
}

/// Load an event the caller is allowed to change.
pub(crate) async fn find_owned_event(
    state: &AppState,
    user: &AuthUser,
    id: DbId,
) -> AppResult<Event> {
    let event = find_event(state, id).await?;
    user.ensure_owns(event.created_by)?;
    Ok(event)
}

/// GET /api/v1/events
///
/// Admins see every event, leaders only their own. Newest first.
pub async fn list_events(
    RequireLeader(user): RequireLeader,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let created_by = (!user.is_admin()).then_some(user.user_id);
    let events = EventRepo::list(&state.pool, created_by, params.limit(), params.offset()).await?;
    Ok(Json(DataResponse { data: events }))
}

/// POST /api/v1/events
pub async fn create_event(
    RequireLeader(user): RequireLeader,
    State(state): State<AppState>,
    Json(input): Json<CreateEvent>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    if let Some(duration) = input.duration_hours {
        tiketon_core::accrual::validate_duration(duration)?;
    }

    let event = EventRepo::create(&state.pool, user.user_id, &input).await?;
    tracing::info!(event_id = event.id, created_by = user.user_id, "Event created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: event })))
}

/// GET /api/v1/events/{id}
pub async fn get_event(
    RequireLeader(user): RequireLeader,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let event = find_owned_event(&state, &user, id).await?;
    Ok(Json(DataResponse { data: event }))
}

/// PUT /api/v1/events/{id}
pub async fn update_event(
    RequireLeader(user): RequireLeader,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateEvent>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    find_owned_event(&state, &user, id).await?;

    let event = EventRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "event", id }))?;
    Ok(Json(DataResponse { data: event }))
}

/// DELETE /api/v1/events/{id}
///
/// Removes the event and, by cascade, its participation ledger.
pub async fn delete_event(
    RequireLeader(user): RequireLeader,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    find_owned_event(&state, &user, id).await?;
    if !EventRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "event", id }));
    }
    tracing::info!(event_id = id, deleted_by = user.user_id, "Event deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/events/{id}/duration
///
/// Store the duration and recompute every participant's hours with the
/// configured accrual policy.
pub async fn set_duration(
    RequireLeader(user): RequireLeader,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SetDuration>,
) -> AppResult<impl IntoResponse> {
    find_owned_event(&state, &user, id).await?;
    let outcome =
        ParticipantRepo::set_duration(&state.pool, id, input.duration_hours, state.config.accrual)
            .await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /api/v1/events/{id}/recompute
///
/// Recompute hours from the stored duration (0 when none is set).
pub async fn recompute(
    RequireLeader(user): RequireLeader,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_owned_event(&state, &user, id).await?;
    let outcome = ParticipantRepo::recompute(&state.pool, id, state.config.accrual).await?;
    Ok(Json(DataResponse { data: outcome }))
}

//! Admin handlers for users and team-leader registration.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tiketon_core::error::CoreError;
use tiketon_core::roles::{ROLE_ADMIN, ROLE_TEAM_LEADER};
use tiketon_core::types::DbId;
use tiketon_db::models::user::RegisterTeamLeader;
use tiketon_db::repositories::{TeamLeaderRepo, UserRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UserListParams {
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetActive {
    pub is_active: bool,
}

/// GET /api/v1/admin/users
pub async fn list_users(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<UserListParams>,
) -> AppResult<impl IntoResponse> {
    let role = params.role.as_deref();
    if let Some(role) = role {
        if role != ROLE_ADMIN && role != ROLE_TEAM_LEADER {
            return Err(AppError::BadRequest(format!("Unknown role '{role}'")));
        }
    }
    let users = UserRepo::list(&state.pool, role).await?;
    Ok(Json(DataResponse { data: users }))
}

/// PATCH /api/v1/admin/users/{id}
///
/// Activate or deactivate a user. Inactive admins receive no purge summaries.
pub async fn set_active(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SetActive>,
) -> AppResult<impl IntoResponse> {
    let user = UserRepo::set_active(&state.pool, id, input.is_active)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "user", id }))?;
    tracing::info!(user_id = id, is_active = input.is_active, changed_by = admin.user_id, "User activation changed");
    Ok(Json(DataResponse { data: user }))
}

/// POST /api/v1/admin/team-leaders
///
/// Finds the leader's scanner record (by email, then by name) or creates
/// it, then creates the `team_leader` user linked to it.
pub async fn register_team_leader(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<RegisterTeamLeader>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let registration = TeamLeaderRepo::register(&state.pool, &input).await?;
    tracing::info!(
        user_id = registration.user.id,
        scanner_id = registration.scanner_id,
        scanner_created = registration.scanner_created,
        registered_by = admin.user_id,
        "Team leader registered"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: registration })))
}

//! Handlers for the `/scanners` resource (volunteers).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tiketon_core::error::CoreError;
use tiketon_core::types::DbId;
use tiketon_db::models::scanner::{CreateScanner, Scanner, ScannerSummary, UpdateScanner};
use tiketon_db::repositories::ScannerRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireLeader};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /scanners`.
#[derive(Debug, Deserialize)]
pub struct ScannerListParams {
    /// Case-insensitive match on first name, last name or email.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub(crate) async fn find_scanner(state: &AppState, id: DbId) -> AppResult<Scanner> {
    ScannerRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "scanner", id }))
}

/// GET /api/v1/scanners
pub async fn list_scanners(
    RequireLeader(_user): RequireLeader,
    State(state): State<AppState>,
    Query(params): Query<ScannerListParams>,
) -> AppResult<impl IntoResponse> {
    let page = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    };
    let search = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let scanners = ScannerRepo::list(&state.pool, search, page.limit(), page.offset()).await?;
    Ok(Json(DataResponse { data: scanners }))
}

/// POST /api/v1/scanners
pub async fn create_scanner(
    RequireLeader(_user): RequireLeader,
    State(state): State<AppState>,
    Json(input): Json<CreateScanner>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let scanner = ScannerRepo::create(&state.pool, &input).await?;
    tracing::info!(scanner_id = scanner.id, "Scanner created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: scanner })))
}

/// GET /api/v1/scanners/{id}
pub async fn get_scanner(
    RequireLeader(_user): RequireLeader,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let scanner = find_scanner(&state, id).await?;
    Ok(Json(DataResponse { data: scanner }))
}

/// PUT /api/v1/scanners/{id}
///
/// Contact details only; `total_certificate_hours` changes through
/// certificate issuance.
pub async fn update_scanner(
    RequireLeader(_user): RequireLeader,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateScanner>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let scanner = ScannerRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "scanner", id }))?;
    Ok(Json(DataResponse { data: scanner }))
}

/// DELETE /api/v1/scanners/{id}
///
/// Admin only. Cascades to the scanner's ledger entries.
pub async fn delete_scanner(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !ScannerRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "scanner", id }));
    }
    tracing::info!(scanner_id = id, deleted_by = admin.user_id, "Scanner deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/scanners/{id}/events
///
/// Every participation with its pending hours, plus `current_hours` (the
/// pending sum) and the cumulative `total_certificate_hours`.
pub async fn scanner_summary(
    RequireLeader(_user): RequireLeader,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let scanner = find_scanner(&state, id).await?;
    let participations = ScannerRepo::participations(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: ScannerSummary::new(scanner, participations),
    }))
}

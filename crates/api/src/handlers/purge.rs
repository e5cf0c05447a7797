//! Admin handlers for retention purge settings and previews.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tiketon_core::retention::{validate_notification_days, PurgeMode, PurgePolicy};
use tiketon_db::models::purge_settings::{PurgeSettings, UpsertPurgeSettings};
use tiketon_db::repositories::PurgeSettingsRepo;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Stored settings (if any) and the policy a run would use.
#[derive(Debug, Serialize)]
pub struct PurgeSettingsView {
    pub settings: Option<PurgeSettings>,
    pub effective: PurgePolicy,
}

#[derive(Debug, Deserialize)]
pub struct PreviewParams {
    /// Evaluate as of this date instead of today (UTC).
    pub today: Option<NaiveDate>,
}

/// GET /api/v1/admin/purge/settings
pub async fn get_settings(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let settings = PurgeSettingsRepo::get(&state.pool).await?;
    let effective = settings
        .as_ref()
        .map(PurgeSettings::policy)
        .unwrap_or_else(PurgePolicy::defaults);
    Ok(Json(DataResponse {
        data: PurgeSettingsView {
            settings,
            effective,
        },
    }))
}

/// PUT /api/v1/admin/purge/settings
///
/// Replaces the single settings row.
pub async fn update_settings(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<UpsertPurgeSettings>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    validate_notification_days(input.notification_days_before)?;

    let settings = PurgeSettingsRepo::upsert(&state.pool, &input).await?;
    tracing::info!(
        notification_days_before = settings.notification_days_before,
        is_active = settings.is_active,
        purge_date = ?settings.purge_date,
        changed_by = admin.user_id,
        "Purge settings updated"
    );
    Ok(Json(DataResponse { data: settings }))
}

/// GET /api/v1/admin/purge/preview
///
/// Dry run: what a purge would delete and whom it would warn. Sends nothing
/// and deletes nothing.
pub async fn preview(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<PreviewParams>,
) -> AppResult<impl IntoResponse> {
    let today = params.today.unwrap_or_else(|| chrono::Utc::now().date_naive());
    let report = state.purge.run(today, PurgeMode::DRY_RUN).await?;
    Ok(Json(DataResponse { data: report }))
}

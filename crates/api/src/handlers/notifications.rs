//! Admin handlers for the notification audit log and test sends.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tiketon_db::models::notification_log::NotificationLogQuery;
use tiketon_db::repositories::NotificationLogRepo;
use tiketon_notify::{OutgoingMessage, Recipient};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::{DataResponse, PageResponse};
use crate::state::AppState;

const TEST_SUBJECT: &str = "Test notification";
const TEST_BODY: &str = "This is a test notification from Tiketon.";

/// Request body for `POST /admin/notifications/test`.
#[derive(Debug, Deserialize, Validate)]
pub struct TestNotification {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub telegram_id: Option<String>,
    #[validate(length(min = 1, max = 4000))]
    pub message: Option<String>,
}

/// GET /api/v1/admin/notifications
///
/// Audit log, newest first. Filters: `channel`, `delivered`, `is_test`.
pub async fn list_logs(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<NotificationLogQuery>,
) -> AppResult<impl IntoResponse> {
    let logs = NotificationLogRepo::list(&state.pool, &params).await?;
    let total = NotificationLogRepo::count(&state.pool, &params).await?;
    Ok(Json(PageResponse { data: logs, total }))
}

/// GET /api/v1/admin/notifications/channels
pub async fn channels(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> impl IntoResponse {
    Json(DataResponse {
        data: state.dispatcher.channels(),
    })
}

/// POST /api/v1/admin/notifications/test
///
/// Sends a test message through the normal chat-then-email path. The audit
/// row is flagged `is_test`. Delivery failures come back as 502/503.
pub async fn send_test(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<TestNotification>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    if input.email.is_none() && input.telegram_id.is_none() {
        return Err(AppError::BadRequest(
            "Provide an email, a telegram_id, or both".into(),
        ));
    }

    let recipient = Recipient {
        display_name: input
            .email
            .clone()
            .or_else(|| input.telegram_id.clone())
            .unwrap_or_default(),
        email: input.email,
        chat_id: input.telegram_id,
    };
    let message = OutgoingMessage::test(TEST_SUBJECT, input.message.as_deref().unwrap_or(TEST_BODY));

    let receipt = state.dispatcher.send(&recipient, &message).await?;
    tracing::info!(channel = receipt.channel, sent_by = admin.user_id, "Test notification sent");
    Ok(Json(DataResponse { data: receipt }))
}

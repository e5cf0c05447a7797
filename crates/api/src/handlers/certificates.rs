//! Certificate issuance handlers.
//!
//! Every endpoint here consumes pending hours: the ledger entries covered by
//! a certificate are zeroed in the same transaction that renders it. Single
//! issuances return the artifact; batch issuances return a zip with a
//! `manifest.json` of successes and failures.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use tiketon_core::certificate::{participation_file_name, scanner_file_name, ArtifactFormat};
use tiketon_core::error::CoreError;
use tiketon_core::types::DbId;
use tiketon_db::repositories::{CertificateRepo, ParticipantRepo, ScannerRepo};
use tiketon_db::LedgerError;

use crate::certificates::archive::IssuedItem;
use crate::certificates::ArchiveBuilder;
use crate::error::{AppError, AppResult};
use crate::handlers::events::find_owned_event;
use crate::handlers::scanners::find_scanner;
use crate::middleware::rbac::{RequireAdmin, RequireLeader};
use crate::query::CertificateParams;
use crate::state::AppState;

const ZIP_CONTENT_TYPE: &str = "application/zip";

fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

/// POST /api/v1/events/{id}/participants/{participant_id}/certificate
///
/// Certificate for one participation. Zeroes that entry's hours; the
/// scanner's `total_certificate_hours` is not changed.
pub async fn issue_participation(
    RequireLeader(user): RequireLeader,
    State(state): State<AppState>,
    Path((event_id, participant_id)): Path<(DbId, DbId)>,
    Query(params): Query<CertificateParams>,
) -> AppResult<Response> {
    let event = find_owned_event(&state, &user, event_id).await?;
    let participant = ParticipantRepo::find_by_id(&state.pool, participant_id)
        .await?
        .filter(|p| p.event_id == event_id)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "participant",
            id: participant_id,
        }))?;
    let scanner = find_scanner(&state, participant.scanner_id).await?;

    let format = ArtifactFormat::parse(params.format.as_deref());
    let issued = CertificateRepo::issue_for_participation(&state.pool, participant_id, today(), |doc| {
        state.renderer.render(doc, format)
    })
    .await?;

    let file_name = participation_file_name(&scanner.last_name, &event.name, format);
    Ok(attachment(format.content_type(), &file_name, issued.artifact))
}

/// POST /api/v1/scanners/{id}/certificate
///
/// Aggregate certificate for all of a scanner's pending hours.
/// `?itemized=true` lists every contributing event.
pub async fn issue_scanner(
    RequireLeader(_user): RequireLeader,
    State(state): State<AppState>,
    Path(scanner_id): Path<DbId>,
    Query(params): Query<CertificateParams>,
) -> AppResult<Response> {
    let scanner = find_scanner(&state, scanner_id).await?;
    let format = ArtifactFormat::parse(params.format.as_deref());
    let issued = CertificateRepo::issue_for_scanner(
        &state.pool,
        scanner_id,
        params.itemized,
        today(),
        |doc| state.renderer.render(doc, format),
    )
    .await?;

    let file_name = scanner_file_name(scanner.id, &scanner.first_name, &scanner.last_name, format);
    Ok(attachment(format.content_type(), &file_name, issued.artifact))
}

/// POST /api/v1/events/{id}/certificates
///
/// Issue a participation certificate for every participant of the event.
/// Participants without pending hours are listed as failures in the
/// manifest; the request fails with 422 only when nobody had hours.
pub async fn issue_event_batch(
    RequireLeader(user): RequireLeader,
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
    Query(params): Query<CertificateParams>,
) -> AppResult<Response> {
    let event = find_owned_event(&state, &user, event_id).await?;
    let participants = ParticipantRepo::list_for_event(&state.pool, event_id).await?;
    let format = ArtifactFormat::parse(params.format.as_deref());
    let issued_on = today();

    let mut archive = ArchiveBuilder::new(issued_on, format);
    for participant in participants {
        let result = CertificateRepo::issue_for_participation(&state.pool, participant.id, issued_on, |doc| {
            state.renderer.render(doc, format)
        })
        .await;
        match result {
            Ok(issued) => archive.add_issued(
                IssuedItem {
                    id: participant.id,
                    scanner_id: participant.scanner_id,
                    file: participation_file_name(&participant.last_name, &event.name, format),
                    hours: issued.document.hours,
                    hours_claimed: issued.hours_claimed,
                },
                issued.artifact,
            ),
            Err(e) => {
                log_batch_failure(participant.id, &e);
                archive.add_failure(participant.id, e);
            }
        }
    }

    tracing::info!(
        event_id,
        issued = archive.issued_count(),
        failed = archive.failed_count(),
        "Event certificate batch finished"
    );
    let bytes = archive.finish()?;
    let file_name = format!("certificates_event_{event_id}_{issued_on}.zip");
    Ok(attachment(ZIP_CONTENT_TYPE, &file_name, bytes))
}

/// POST /api/v1/certificates/scanners
///
/// Admin only. Aggregate certificates for every scanner with pending hours.
pub async fn issue_all_scanners(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<CertificateParams>,
) -> AppResult<Response> {
    let scanner_ids = ScannerRepo::ids_with_pending_hours(&state.pool).await?;
    let format = ArtifactFormat::parse(params.format.as_deref());
    let issued_on = today();

    let mut archive = ArchiveBuilder::new(issued_on, format);
    for scanner_id in scanner_ids {
        let result = CertificateRepo::issue_for_scanner(
            &state.pool,
            scanner_id,
            params.itemized,
            issued_on,
            |doc| state.renderer.render(doc, format),
        )
        .await;
        match result {
            Ok(issued) => archive.add_issued(
                IssuedItem {
                    id: scanner_id,
                    scanner_id,
                    file: scanner_file_name(scanner_id, &issued.first_name, &issued.last_name, format),
                    hours: issued.document.hours,
                    hours_claimed: issued.hours_claimed,
                },
                issued.artifact,
            ),
            Err(e) => {
                log_batch_failure(scanner_id, &e);
                archive.add_failure(scanner_id, e);
            }
        }
    }

    tracing::info!(
        issued = archive.issued_count(),
        failed = archive.failed_count(),
        "Scanner certificate batch finished"
    );
    let bytes = archive.finish()?;
    let file_name = format!("certificates_{issued_on}.zip");
    Ok(attachment(ZIP_CONTENT_TYPE, &file_name, bytes))
}

fn log_batch_failure(id: DbId, err: &LedgerError) {
    match err {
        LedgerError::Core(e) => tracing::debug!(id, error = %e, "Certificate skipped"),
        LedgerError::Database(e) => tracing::error!(id, error = %e, "Certificate issuance failed"),
    }
}

/// Binary download response with a `Content-Disposition` that survives
/// non-ASCII names.
fn attachment(content_type: &'static str, file_name: &str, bytes: Vec<u8>) -> Response {
    let disposition = HeaderValue::from_str(&content_disposition(file_name))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

/// `attachment; filename="<ascii>"; filename*=UTF-8''<percent-encoded>`.
fn content_disposition(file_name: &str) -> String {
    let ascii: String = file_name
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' { c } else { '_' })
        .collect();
    let mut encoded = String::with_capacity(file_name.len());
    for byte in file_name.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    format!("attachment; filename=\"{ascii}\"; filename*=UTF-8''{encoded}")
}

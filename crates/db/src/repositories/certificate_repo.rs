//! Certificate issuance: claim pending hours and reset them to zero.
//!
//! Each issuance runs in one transaction that locks what it claims, builds
//! the [`CertificateDocument`], hands it to the caller's renderer, zeroes
//! the claimed entries and commits. A renderer error rolls everything back,
//! so hours are only consumed when an artifact was actually produced.
//!
//! Lock order is scanner row (aggregate issuance only) then ledger rows,
//! which serializes concurrent claims on the same hours.

use chrono::NaiveDate;
use sqlx::PgPool;
use tiketon_core::certificate::{aggregate, CertificateDocument, PendingEntry};
use tiketon_core::error::CoreError;
use tiketon_core::types::DbId;

use crate::error::LedgerResult;
use crate::repositories::{ParticipantRepo, ScannerRepo};

/// A committed issuance together with the rendered artifact.
#[derive(Debug, Clone)]
pub struct IssuedCertificate<T> {
    pub document: CertificateDocument,
    pub artifact: T,
    pub scanner_id: DbId,
    /// Scanner names as read under the issuance lock, for file naming.
    pub first_name: String,
    pub last_name: String,
    /// Ledger entries that were reset to zero.
    pub participant_ids: Vec<DbId>,
    /// Exact pending hours consumed (before rounding).
    pub hours_claimed: f64,
    /// The scanner's new running total, for aggregate issuance.
    pub total_certificate_hours: Option<f64>,
}

/// Provides certificate issuance operations.
pub struct CertificateRepo;

impl CertificateRepo {
    /// Issue a certificate for one participation and zero its hours.
    ///
    /// A missing entry (for example deleted by a concurrent purge) fails with
    /// `NotFound`; an entry whose hours would print as zero fails with
    /// `NoHoursAvailable` before anything is rendered and stays pending. The scanner's
    /// `total_certificate_hours` is left unchanged.
    pub async fn issue_for_participation<T, F>(
        pool: &PgPool,
        participant_id: DbId,
        issued_on: NaiveDate,
        render: F,
    ) -> LedgerResult<IssuedCertificate<T>>
    where
        F: FnOnce(&CertificateDocument) -> Result<T, CoreError>,
    {
        let mut tx = pool.begin().await?;

        let row = ParticipantRepo::lock_for_claim(&mut tx, participant_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "participant",
                id: participant_id,
            })?;

        let leader_name = format!("{} {}", row.leader_first_name, row.leader_last_name);
        let document = CertificateDocument::for_participation(
            &row.first_name,
            &row.last_name,
            row.hours_awarded,
            &row.event_name,
            row.event_date,
            Some(leader_name),
            issued_on,
        )?;
        let artifact = render(&document)?;

        ParticipantRepo::zero(&mut tx, &[row.id]).await?;
        tx.commit().await?;

        tracing::info!(
            participant_id,
            scanner_id = row.scanner_id,
            hours = row.hours_awarded,
            printed_hours = document.hours,
            "Participation certificate issued"
        );

        Ok(IssuedCertificate {
            document,
            artifact,
            scanner_id: row.scanner_id,
            first_name: row.first_name,
            last_name: row.last_name,
            participant_ids: vec![row.id],
            hours_claimed: row.hours_awarded,
            total_certificate_hours: None,
        })
    }

    /// Issue an aggregate certificate for all pending hours of a scanner.
    ///
    /// Adds the exact sum to `total_certificate_hours` and zeroes every
    /// contributing entry. Fails with `NoHoursAvailable` when the sum would
    /// print as zero hours; the entries then stay pending.
    pub async fn issue_for_scanner<T, F>(
        pool: &PgPool,
        scanner_id: DbId,
        itemized: bool,
        issued_on: NaiveDate,
        render: F,
    ) -> LedgerResult<IssuedCertificate<T>>
    where
        F: FnOnce(&CertificateDocument) -> Result<T, CoreError>,
    {
        let mut tx = pool.begin().await?;

        let scanner = ScannerRepo::lock(&mut tx, scanner_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "scanner",
                id: scanner_id,
            })?;

        let pending: Vec<PendingEntry> = ParticipantRepo::lock_pending_for_scanner(&mut tx, scanner_id)
            .await?
            .into_iter()
            .map(|row| PendingEntry {
                participant_id: row.id,
                event_name: row.event_name,
                event_date: row.event_date,
                hours: row.hours_awarded,
            })
            .collect();

        let claim = aggregate(&pending)?;
        let document = CertificateDocument::for_claim(
            &scanner.first_name,
            &scanner.last_name,
            &claim,
            itemized,
            issued_on,
        );
        let artifact = render(&document)?;

        let participant_ids = claim.participant_ids();
        ParticipantRepo::zero(&mut tx, &participant_ids).await?;
        let total = ScannerRepo::add_certificate_hours(&mut tx, scanner_id, claim.total_hours).await?;
        tx.commit().await?;

        tracing::info!(
            scanner_id,
            entries = participant_ids.len(),
            hours = claim.total_hours,
            printed_hours = document.hours,
            total_certificate_hours = total,
            "Aggregate certificate issued"
        );

        Ok(IssuedCertificate {
            document,
            artifact,
            scanner_id,
            first_name: scanner.first_name,
            last_name: scanner.last_name,
            participant_ids,
            hours_claimed: claim.total_hours,
            total_certificate_hours: Some(total),
        })
    }
}

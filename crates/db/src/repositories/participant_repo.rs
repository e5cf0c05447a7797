//! Repository for the participation ledger (`event_participants`).
//!
//! Every mutation that depends on the event's capacity or duration locks the
//! event row first (`SELECT ... FOR UPDATE`), so adds and recomputes on the
//! same event are serialized and a recompute never misses a concurrently
//! added participant.

use std::collections::HashSet;

use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tiketon_core::accrual::{normalize_lateness, validate_duration, AccrualPolicy, ParticipationFacts};
use tiketon_core::error::CoreError;
use tiketon_core::types::DbId;

use crate::error::LedgerResult;
use crate::models::event::Event;
use crate::models::participant::{
    BulkAddOutcome, Participant, ParticipantWithScanner, ParticipationClaimRow, PendingEntryRow,
    RecomputeOutcome, UpdateLateness,
};
use crate::repositories::{EventRepo, ScannerRepo};

/// Column list for `event_participants` queries.
const COLUMNS: &str = "id, event_id, scanner_id, is_late, late_minutes, hours_awarded, \
    created_at, updated_at";

/// Same columns qualified with the `p` alias, for joined updates.
const QUALIFIED_COLUMNS: &str = "p.id, p.event_id, p.scanner_id, p.is_late, p.late_minutes, \
    p.hours_awarded, p.created_at, p.updated_at";

/// Inputs to the accrual rule for one locked ledger row.
#[derive(Debug, FromRow)]
struct AccrualRow {
    id: DbId,
    late_minutes: Option<i32>,
    is_event_creator: bool,
}

/// Provides ledger operations.
pub struct ParticipantRepo;

impl ParticipantRepo {
    /// Participants of an event with scanner names, ordered by last name.
    pub async fn list_for_event(
        pool: &PgPool,
        event_id: DbId,
    ) -> Result<Vec<ParticipantWithScanner>, sqlx::Error> {
        sqlx::query_as::<_, ParticipantWithScanner>(
            "SELECT p.id, p.event_id, p.scanner_id, s.first_name, s.last_name, s.email, \
                    p.is_late, p.late_minutes, p.hours_awarded \
             FROM event_participants p \
             JOIN scanners s ON s.id = p.scanner_id \
             WHERE p.event_id = $1 \
             ORDER BY s.last_name, s.first_name, p.id",
        )
        .bind(event_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Participant>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM event_participants WHERE id = $1");
        sqlx::query_as::<_, Participant>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Ids of every ledger entry of an event, for batch issuance.
    pub async fn ids_for_event(pool: &PgPool, event_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT id FROM event_participants WHERE event_id = $1 ORDER BY id",
        )
        .bind(event_id)
        .fetch_all(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Adding and removing
    // -----------------------------------------------------------------------

    /// Add one scanner to an event.
    ///
    /// Fails with `DuplicateParticipant` if the pairing exists and with
    /// `CapacityExceeded` if the event already has `max_scanners` entries.
    /// The new entry starts at zero hours.
    pub async fn add(pool: &PgPool, event_id: DbId, scanner_id: DbId) -> LedgerResult<Participant> {
        let mut tx = pool.begin().await?;
        let event = lock_event(&mut tx, event_id).await?;

        if ScannerRepo::find_by_id(&mut *tx, scanner_id).await?.is_none() {
            return Err(CoreError::NotFound {
                entity: "scanner",
                id: scanner_id,
            }
            .into());
        }

        let present = Self::scanner_ids_locked(&mut tx, event_id).await?;
        if present.contains(&scanner_id) {
            return Err(CoreError::DuplicateParticipant {
                event_id,
                scanner_id,
            }
            .into());
        }
        if present.len() as i64 >= i64::from(event.max_scanners) {
            return Err(CoreError::CapacityExceeded {
                event_id,
                max_scanners: event.max_scanners,
            }
            .into());
        }

        let participant = Self::insert(&mut tx, event_id, scanner_id).await?;
        tx.commit().await?;

        tracing::info!(event_id, scanner_id, participant_id = participant.id, "Participant added");
        Ok(participant)
    }

    /// Add several scanners in request order until the event is full.
    ///
    /// Pairings that already exist (or repeat within the request) are
    /// reported as duplicates; scanners left over once capacity is reached
    /// are reported as `over_capacity`. Unknown scanner ids fail the whole
    /// call with `NotFound` and nothing is added.
    pub async fn bulk_add(
        pool: &PgPool,
        event_id: DbId,
        scanner_ids: &[DbId],
    ) -> LedgerResult<BulkAddOutcome> {
        let mut tx = pool.begin().await?;
        let event = lock_event(&mut tx, event_id).await?;

        let known: HashSet<DbId> =
            sqlx::query_scalar::<_, DbId>("SELECT id FROM scanners WHERE id = ANY($1)")
                .bind(scanner_ids)
                .fetch_all(&mut *tx)
                .await?
                .into_iter()
                .collect();
        if let Some(&missing) = scanner_ids.iter().find(|id| !known.contains(id)) {
            return Err(CoreError::NotFound {
                entity: "scanner",
                id: missing,
            }
            .into());
        }

        let mut present = Self::scanner_ids_locked(&mut tx, event_id).await?;
        let capacity = i64::from(event.max_scanners);
        let mut outcome = BulkAddOutcome::default();

        for &scanner_id in scanner_ids {
            if present.contains(&scanner_id) {
                outcome.duplicates.push(scanner_id);
            } else if present.len() as i64 >= capacity {
                outcome.over_capacity.push(scanner_id);
            } else {
                let participant = Self::insert(&mut tx, event_id, scanner_id).await?;
                present.insert(scanner_id);
                outcome.added.push(participant);
            }
        }

        tx.commit().await?;

        tracing::info!(
            event_id,
            added = outcome.added.len(),
            duplicates = outcome.duplicates.len(),
            over_capacity = outcome.over_capacity.len(),
            "Bulk participant add"
        );
        Ok(outcome)
    }

    /// Remove a ledger entry. Returns `false` (and does nothing) when the
    /// entry does not exist or belongs to another event.
    pub async fn remove(pool: &PgPool, event_id: DbId, participant_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM event_participants WHERE id = $1 AND event_id = $2")
            .bind(participant_id)
            .bind(event_id)
            .execute(pool)
            .await?;
        let removed = result.rows_affected() > 0;
        if removed {
            tracing::info!(event_id, participant_id, "Participant removed");
        }
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Lateness and hours
    // -----------------------------------------------------------------------

    /// Record lateness for a participant. Hours are not recomputed until the
    /// next duration edit or explicit recompute.
    pub async fn set_lateness(
        pool: &PgPool,
        event_id: DbId,
        participant_id: DbId,
        input: &UpdateLateness,
    ) -> LedgerResult<Participant> {
        let late_minutes = normalize_lateness(input.is_late, input.late_minutes)?;
        let query = format!(
            "UPDATE event_participants \
             SET is_late = $3, late_minutes = $4, updated_at = NOW() \
             WHERE id = $1 AND event_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Participant>(&query)
            .bind(participant_id)
            .bind(event_id)
            .bind(input.is_late)
            .bind(late_minutes)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound {
                    entity: "participant",
                    id: participant_id,
                }
                .into()
            })
    }

    /// Set an event's duration and recompute every participant's hours in
    /// the same transaction.
    pub async fn set_duration(
        pool: &PgPool,
        event_id: DbId,
        duration_hours: f64,
        policy: AccrualPolicy,
    ) -> LedgerResult<RecomputeOutcome> {
        let duration_hours = validate_duration(duration_hours)?;
        let mut tx = pool.begin().await?;
        lock_event(&mut tx, event_id).await?;
        EventRepo::set_duration(&mut tx, event_id, duration_hours).await?;
        let participants = Self::recompute_locked(&mut tx, event_id, duration_hours, policy).await?;
        tx.commit().await?;

        tracing::info!(
            event_id,
            duration_hours,
            participants = participants.len(),
            ?policy,
            "Event duration set, hours recomputed"
        );
        Ok(RecomputeOutcome {
            event_id,
            duration_hours,
            participants,
        })
    }

    /// Recompute every participant from the stored duration. Events without
    /// a duration recompute to zero.
    pub async fn recompute(
        pool: &PgPool,
        event_id: DbId,
        policy: AccrualPolicy,
    ) -> LedgerResult<RecomputeOutcome> {
        let mut tx = pool.begin().await?;
        let event = lock_event(&mut tx, event_id).await?;
        let duration_hours = event.duration_hours.unwrap_or(0.0);
        let participants = Self::recompute_locked(&mut tx, event_id, duration_hours, policy).await?;
        tx.commit().await?;

        tracing::info!(
            event_id,
            duration_hours,
            participants = participants.len(),
            ?policy,
            "Hours recomputed"
        );
        Ok(RecomputeOutcome {
            event_id,
            duration_hours,
            participants,
        })
    }

    /// Apply the accrual policy to every entry of a locked event with a
    /// single batch UPDATE.
    async fn recompute_locked(
        tx: &mut Transaction<'_, Postgres>,
        event_id: DbId,
        duration_hours: f64,
        policy: AccrualPolicy,
    ) -> Result<Vec<Participant>, sqlx::Error> {
        let rows = sqlx::query_as::<_, AccrualRow>(
            "SELECT p.id, \
                    CASE WHEN p.is_late THEN p.late_minutes END AS late_minutes, \
                    COALESCE(u.scanner_id = p.scanner_id, FALSE) AS is_event_creator \
             FROM event_participants p \
             JOIN events e ON e.id = p.event_id \
             JOIN users u ON u.id = e.created_by \
             WHERE p.event_id = $1 \
             ORDER BY p.id \
             FOR UPDATE OF p",
        )
        .bind(event_id)
        .fetch_all(&mut **tx)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let (ids, hours): (Vec<DbId>, Vec<f64>) = rows
            .iter()
            .map(|row| {
                let facts = ParticipationFacts {
                    late_minutes: row.late_minutes,
                    is_event_creator: row.is_event_creator,
                };
                (row.id, policy.awarded_hours(duration_hours, facts))
            })
            .unzip();

        let query = format!(
            "UPDATE event_participants p \
             SET hours_awarded = v.hours, updated_at = NOW() \
             FROM UNNEST($1::BIGINT[], $2::DOUBLE PRECISION[]) AS v(id, hours) \
             WHERE p.id = v.id \
             RETURNING {QUALIFIED_COLUMNS}"
        );
        let mut updated = sqlx::query_as::<_, Participant>(&query)
            .bind(&ids)
            .bind(&hours)
            .fetch_all(&mut **tx)
            .await?;
        updated.sort_by_key(|p| p.id);
        Ok(updated)
    }

    // -----------------------------------------------------------------------
    // Certificate claims
    // -----------------------------------------------------------------------

    /// Lock one ledger entry together with what its certificate prints.
    pub async fn lock_for_claim(
        tx: &mut Transaction<'_, Postgres>,
        participant_id: DbId,
    ) -> Result<Option<ParticipationClaimRow>, sqlx::Error> {
        sqlx::query_as::<_, ParticipationClaimRow>(
            "SELECT p.id, p.scanner_id, p.hours_awarded, s.first_name, s.last_name, \
                    e.name AS event_name, e.date AS event_date, \
                    u.first_name AS leader_first_name, u.last_name AS leader_last_name \
             FROM event_participants p \
             JOIN scanners s ON s.id = p.scanner_id \
             JOIN events e ON e.id = p.event_id \
             JOIN users u ON u.id = e.created_by \
             WHERE p.id = $1 \
             FOR UPDATE OF p",
        )
        .bind(participant_id)
        .fetch_optional(&mut **tx)
        .await
    }

    /// Lock every entry of a scanner that still has pending hours.
    pub async fn lock_pending_for_scanner(
        tx: &mut Transaction<'_, Postgres>,
        scanner_id: DbId,
    ) -> Result<Vec<PendingEntryRow>, sqlx::Error> {
        sqlx::query_as::<_, PendingEntryRow>(
            "SELECT p.id, e.name AS event_name, e.date AS event_date, p.hours_awarded \
             FROM event_participants p \
             JOIN events e ON e.id = p.event_id \
             WHERE p.scanner_id = $1 AND p.hours_awarded > 0 \
             ORDER BY p.id \
             FOR UPDATE OF p",
        )
        .bind(scanner_id)
        .fetch_all(&mut **tx)
        .await
    }

    /// Reset pending hours of the given (locked) entries to zero.
    pub async fn zero(tx: &mut Transaction<'_, Postgres>, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE event_participants SET hours_awarded = 0, updated_at = NOW() WHERE id = ANY($1)",
        )
        .bind(ids)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn scanner_ids_locked(
        tx: &mut Transaction<'_, Postgres>,
        event_id: DbId,
    ) -> Result<HashSet<DbId>, sqlx::Error> {
        let ids = sqlx::query_scalar::<_, DbId>(
            "SELECT scanner_id FROM event_participants WHERE event_id = $1",
        )
        .bind(event_id)
        .fetch_all(&mut **tx)
        .await?;
        Ok(ids.into_iter().collect())
    }

    async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        event_id: DbId,
        scanner_id: DbId,
    ) -> Result<Participant, sqlx::Error> {
        let query = format!(
            "INSERT INTO event_participants (event_id, scanner_id) \
             VALUES ($1, $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Participant>(&query)
            .bind(event_id)
            .bind(scanner_id)
            .fetch_one(&mut **tx)
            .await
    }
}

/// Lock an event or fail with `NotFound`.
async fn lock_event(tx: &mut Transaction<'_, Postgres>, event_id: DbId) -> LedgerResult<Event> {
    EventRepo::lock(tx, event_id).await?.ok_or_else(|| {
        CoreError::NotFound {
            entity: "event",
            id: event_id,
        }
        .into()
    })
}

//! Repository for the `scanners` table.

use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use tiketon_core::types::DbId;

use crate::models::scanner::{CreateScanner, Scanner, ScannerParticipation, UpdateScanner};

/// Column list for `scanners` queries.
const COLUMNS: &str = "id, first_name, last_name, email, telegram_id, \
    total_certificate_hours, created_at, updated_at";

/// Provides CRUD operations for scanners.
pub struct ScannerRepo;

impl ScannerRepo {
    /// Insert a new scanner, returning the created row.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        input: &CreateScanner,
    ) -> Result<Scanner, sqlx::Error> {
        let query = format!(
            "INSERT INTO scanners (first_name, last_name, email, telegram_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Scanner>(&query)
            .bind(input.first_name.trim())
            .bind(input.last_name.trim())
            .bind(input.email.as_deref().map(str::trim))
            .bind(&input.telegram_id)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Scanner>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scanners WHERE id = $1");
        sqlx::query_as::<_, Scanner>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Case-insensitive email lookup.
    pub async fn find_by_email<'e>(
        executor: impl PgExecutor<'e>,
        email: &str,
    ) -> Result<Option<Scanner>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scanners WHERE LOWER(email) = LOWER($1)");
        sqlx::query_as::<_, Scanner>(&query)
            .bind(email.trim())
            .fetch_optional(executor)
            .await
    }

    /// First scanner (lowest id) with exactly this first and last name.
    pub async fn find_by_name<'e>(
        executor: impl PgExecutor<'e>,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<Scanner>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM scanners \
             WHERE first_name = $1 AND last_name = $2 \
             ORDER BY id LIMIT 1"
        );
        sqlx::query_as::<_, Scanner>(&query)
            .bind(first_name.trim())
            .bind(last_name.trim())
            .fetch_optional(executor)
            .await
    }

    /// List scanners ordered by last name, optionally filtered by a
    /// case-insensitive name or email substring.
    pub async fn list(
        pool: &PgPool,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Scanner>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM scanners \
             WHERE $1::TEXT IS NULL \
                OR first_name ILIKE '%' || $1 || '%' \
                OR last_name ILIKE '%' || $1 || '%' \
                OR email ILIKE '%' || $1 || '%' \
             ORDER BY last_name, first_name, id \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Scanner>(&query)
            .bind(search.map(str::trim).filter(|s| !s.is_empty()))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Update contact details. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateScanner,
    ) -> Result<Option<Scanner>, sqlx::Error> {
        let query = format!(
            "UPDATE scanners SET \
                first_name = COALESCE($2, first_name), \
                last_name = COALESCE($3, last_name), \
                email = COALESCE($4, email), \
                telegram_id = COALESCE($5, telegram_id), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Scanner>(&query)
            .bind(id)
            .bind(input.first_name.as_deref().map(str::trim))
            .bind(input.last_name.as_deref().map(str::trim))
            .bind(input.email.as_deref().map(str::trim))
            .bind(&input.telegram_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a scanner; its ledger entries cascade. Returns `true` if a row
    /// was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM scanners WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Every participation of a scanner, newest event first.
    pub async fn participations(
        pool: &PgPool,
        scanner_id: DbId,
    ) -> Result<Vec<ScannerParticipation>, sqlx::Error> {
        sqlx::query_as::<_, ScannerParticipation>(
            "SELECT p.id AS participant_id, e.id AS event_id, e.name AS event_name, \
                    e.date AS event_date, p.hours_awarded \
             FROM event_participants p \
             JOIN events e ON e.id = p.event_id \
             WHERE p.scanner_id = $1 \
             ORDER BY e.date DESC, p.id DESC",
        )
        .bind(scanner_id)
        .fetch_all(pool)
        .await
    }

    /// Ids of scanners with any pending hours, for system-wide issuance.
    pub async fn ids_with_pending_hours(pool: &PgPool) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT DISTINCT scanner_id FROM event_participants \
             WHERE hours_awarded > 0 \
             ORDER BY scanner_id",
        )
        .fetch_all(pool)
        .await
    }

    // -- transactional helpers used by certificate issuance --

    /// Lock a scanner row for the rest of the transaction. Serializes
    /// concurrent aggregate issuance for the same scanner.
    pub async fn lock(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<Option<Scanner>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scanners WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Scanner>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Add certified hours to the running total.
    pub async fn add_certificate_hours(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        hours: f64,
    ) -> Result<f64, sqlx::Error> {
        sqlx::query_scalar::<_, f64>(
            "UPDATE scanners \
             SET total_certificate_hours = total_certificate_hours + $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING total_certificate_hours",
        )
        .bind(id)
        .bind(hours)
        .fetch_one(&mut **tx)
        .await
    }
}

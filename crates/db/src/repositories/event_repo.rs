//! Repository for the `events` table.

use sqlx::{PgPool, Postgres, Transaction};
use tiketon_core::types::{Date, DbId};

use crate::models::event::{CreateEvent, Event, RetentionEvent, UpdateEvent};

/// Column list for `events` queries.
const COLUMNS: &str = "id, name, date, start_date, end_date, location, \
    max_scanners, duration_hours, created_by, created_at, updated_at";

/// Select list for [`RetentionEvent`], joined with the creator.
const RETENTION_SELECT: &str = "\
    SELECT e.id, e.name, e.date, e.created_by, \
           u.first_name AS creator_first_name, u.last_name AS creator_last_name, \
           u.email AS creator_email, u.telegram_id AS creator_telegram_id \
    FROM events e \
    JOIN users u ON u.id = e.created_by";

/// Provides CRUD and retention queries for events.
pub struct EventRepo;

impl EventRepo {
    /// Insert a new event owned by `created_by`.
    pub async fn create(
        pool: &PgPool,
        created_by: DbId,
        input: &CreateEvent,
    ) -> Result<Event, sqlx::Error> {
        let query = format!(
            "INSERT INTO events \
                (name, date, start_date, end_date, location, max_scanners, duration_hours, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(input.name.trim())
            .bind(input.date)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(&input.location)
            .bind(input.max_scanners)
            .bind(input.duration_hours)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events WHERE id = $1");
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List events newest first, optionally only those created by one user.
    pub async fn list(
        pool: &PgPool,
        created_by: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events \
             WHERE $1::BIGINT IS NULL OR created_by = $1 \
             ORDER BY date DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(created_by)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Update event details. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateEvent,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!(
            "UPDATE events SET \
                name = COALESCE($2, name), \
                date = COALESCE($3, date), \
                start_date = COALESCE($4, start_date), \
                end_date = COALESCE($5, end_date), \
                location = COALESCE($6, location), \
                max_scanners = COALESCE($7, max_scanners), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(input.date)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(&input.location)
            .bind(input.max_scanners)
            .fetch_optional(pool)
            .await
    }

    /// Delete an event; its ledger entries cascade. Returns `true` if a row
    /// was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Lock an event row for the rest of the transaction. Every ledger
    /// mutation takes this lock first.
    pub async fn lock(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Set the stored duration of a locked event.
    pub async fn set_duration(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        duration_hours: f64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE events SET duration_hours = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(duration_hours)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    // -- retention --

    /// Events dated strictly before `cutoff`, with creator contact details.
    pub async fn list_dated_before(
        pool: &PgPool,
        cutoff: Date,
    ) -> Result<Vec<RetentionEvent>, sqlx::Error> {
        let query = format!("{RETENTION_SELECT} WHERE e.date < $1 ORDER BY e.date, e.id");
        sqlx::query_as::<_, RetentionEvent>(&query)
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }

    /// Events dated within `[from, to]` inclusive, with creator contact details.
    pub async fn list_dated_between(
        pool: &PgPool,
        from: Date,
        to: Date,
    ) -> Result<Vec<RetentionEvent>, sqlx::Error> {
        let query = format!(
            "{RETENTION_SELECT} WHERE e.date >= $1 AND e.date <= $2 ORDER BY e.created_by, e.date, e.id"
        );
        sqlx::query_as::<_, RetentionEvent>(&query)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }

    /// Delete the given events (cascading to their ledger entries) and
    /// return how many rows were removed.
    pub async fn delete_many(pool: &PgPool, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM events WHERE id = ANY($1)")
            .bind(ids)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

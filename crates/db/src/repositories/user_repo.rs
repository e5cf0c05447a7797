//! Repository for the `users` table.

use sqlx::{PgExecutor, PgPool};
use tiketon_core::roles::ROLE_ADMIN;
use tiketon_core::types::DbId;

use crate::models::user::{CreateUser, User, UserContact};

/// Column list for `users` queries.
const COLUMNS: &str = "id, first_name, last_name, email, telegram_id, role, \
    scanner_id, is_active, created_at, updated_at";

/// Column list for [`UserContact`] projections.
const CONTACT_COLUMNS: &str = "id, first_name, last_name, email, telegram_id, is_active";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        input: &CreateUser,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (first_name, last_name, email, telegram_id, role, scanner_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(input.first_name.trim())
            .bind(input.last_name.trim())
            .bind(input.email.trim())
            .bind(&input.telegram_id)
            .bind(&input.role)
            .bind(input.scanner_id)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List users, optionally restricted to one role.
    pub async fn list(pool: &PgPool, role: Option<&str>) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users \
             WHERE $1::TEXT IS NULL OR role = $1 \
             ORDER BY last_name, first_name, id"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(role)
            .fetch_all(pool)
            .await
    }

    /// Active administrators, the recipients of purge summaries.
    pub async fn list_active_admins(pool: &PgPool) -> Result<Vec<UserContact>, sqlx::Error> {
        let query = format!(
            "SELECT {CONTACT_COLUMNS} FROM users \
             WHERE role = $1 AND is_active \
             ORDER BY id"
        );
        sqlx::query_as::<_, UserContact>(&query)
            .bind(ROLE_ADMIN)
            .fetch_all(pool)
            .await
    }

    /// Enable or disable a user account.
    pub async fn set_active(pool: &PgPool, id: DbId, is_active: bool) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET is_active = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(is_active)
            .fetch_optional(pool)
            .await
    }
}

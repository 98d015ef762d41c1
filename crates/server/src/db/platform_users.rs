//! Legacy platform user repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use vitrine_core::PlatformUserId;

use super::RepositoryError;
use crate::models::{PlatformRole, PlatformUser};

#[derive(Debug, sqlx::FromRow)]
struct PlatformUserRow {
    id: i64,
    open_id: String,
    name: Option<String>,
    email: Option<String>,
    role: PlatformRole,
    last_signed_in: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<PlatformUserRow> for PlatformUser {
    fn from(row: PlatformUserRow) -> Self {
        Self {
            id: PlatformUserId::new(row.id),
            open_id: row.open_id,
            name: row.name,
            email: row.email,
            role: row.role,
            last_signed_in: row.last_signed_in,
            created_at: row.created_at,
        }
    }
}

/// Repository for legacy platform users.
pub struct PlatformUserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PlatformUserRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or refresh the user identified by `open_id`.
    ///
    /// Name, email and role are overwritten and `last_signed_in` is bumped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        open_id: &str,
        name: Option<&str>,
        email: Option<&str>,
        role: PlatformRole,
    ) -> Result<PlatformUser, RepositoryError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, PlatformUserRow>(
            r"
            INSERT INTO platform_user (open_id, name, email, role, created_at, updated_at, last_signed_in)
            VALUES ($1, $2, $3, $4, $5, $5, $5)
            ON CONFLICT (open_id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                role = excluded.role,
                updated_at = excluded.updated_at,
                last_signed_in = excluded.last_signed_in
            RETURNING id, open_id, name, email, role, last_signed_in, created_at
            ",
        )
        .bind(open_id)
        .bind(name)
        .bind(email)
        .bind(role)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}

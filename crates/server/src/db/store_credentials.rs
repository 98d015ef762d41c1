//! Store owner credential repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use vitrine_core::{Email, StoreCredentialId, StoreId};

use super::RepositoryError;
use crate::models::StoreCredential;

const CREDENTIAL_COLUMNS: &str = "id, store_id, email, last_login_at, created_at";

#[derive(Debug, sqlx::FromRow)]
struct StoreCredentialRow {
    id: i64,
    store_id: i64,
    email: String,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<StoreCredentialRow> for StoreCredential {
    type Error = RepositoryError;

    fn try_from(row: StoreCredentialRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: StoreCredentialId::new(row.id),
            store_id: StoreId::new(row.store_id),
            email,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialPasswordRow {
    #[sqlx(flatten)]
    credential: StoreCredentialRow,
    password_hash: String,
}

/// Repository for store owner credentials.
pub struct StoreCredentialRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> StoreCredentialRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All credentials registered under `email`, oldest first, each with its
    /// password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_email(
        &self,
        email: &Email,
    ) -> Result<Vec<(StoreCredential, String)>, RepositoryError> {
        let rows = sqlx::query_as::<_, CredentialPasswordRow>(&format!(
            "SELECT {CREDENTIAL_COLUMNS}, password_hash FROM store_credential \
             WHERE email = $1 ORDER BY id"
        ))
        .bind(email.as_str())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|r| Ok((StoreCredential::try_from(r.credential)?, r.password_hash)))
            .collect()
    }

    /// The credential of a store together with its password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_store(
        &self,
        store_id: StoreId,
    ) -> Result<Option<(StoreCredential, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialPasswordRow>(&format!(
            "SELECT {CREDENTIAL_COLUMNS}, password_hash FROM store_credential WHERE store_id = $1"
        ))
        .bind(store_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| Ok((StoreCredential::try_from(r.credential)?, r.password_hash)))
            .transpose()
    }

    /// Resolve a session token to its credential.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_session_token(
        &self,
        token: &str,
    ) -> Result<Option<StoreCredential>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreCredentialRow>(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM store_credential WHERE session_token = $1"
        ))
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Store a fresh session token, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the credential does not exist.
    pub async fn set_session_token(
        &self,
        id: StoreCredentialId,
        token: &str,
    ) -> Result<(), RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE store_credential SET session_token = $1, last_login_at = $2, updated_at = $2 \
             WHERE id = $3",
        )
        .bind(token)
        .bind(now)
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Invalidate a session token. The credential itself is kept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear_session_token(&self, token: &str) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE store_credential SET session_token = NULL WHERE session_token = $1")
            .bind(token)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Replace the password hash of a credential.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the credential does not exist.
    pub async fn update_password_hash(
        &self,
        id: StoreCredentialId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE store_credential SET password_hash = $1, updated_at = $2 WHERE id = $3",
        )
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

//! Store repository: tenants and their lifecycle transitions.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use vitrine_core::{Email, Plan, PlatformUserId, StoreId, StoreStatus};

use super::RepositoryError;
use crate::models::Store;

// =============================================================================
// Internal Row Types
// =============================================================================

const STORE_COLUMNS: &str = "id, user_id, name, slug, owner_email, owner_name, owner_whatsapp, \
     cpf_cnpj, category, plan, logo_url, primary_color, secondary_color, whatsapp, status, \
     rejection_reason, trial_ends_at, access_code, plain_password, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: i64,
    user_id: i64,
    name: String,
    slug: String,
    owner_email: String,
    owner_name: String,
    owner_whatsapp: String,
    cpf_cnpj: Option<String>,
    category: Option<String>,
    plan: Plan,
    logo_url: Option<String>,
    primary_color: String,
    secondary_color: String,
    whatsapp: String,
    status: StoreStatus,
    rejection_reason: Option<String>,
    trial_ends_at: Option<DateTime<Utc>>,
    access_code: String,
    plain_password: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        let owner_email = Email::parse(&row.owner_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid owner email for store {}: {e}", row.id))
        })?;

        Ok(Self {
            id: StoreId::new(row.id),
            user_id: (row.user_id != 0).then(|| PlatformUserId::new(row.user_id)),
            name: row.name,
            slug: row.slug,
            owner_email,
            owner_name: row.owner_name,
            owner_whatsapp: row.owner_whatsapp,
            cpf_cnpj: row.cpf_cnpj,
            category: row.category,
            plan: row.plan,
            logo_url: row.logo_url,
            primary_color: row.primary_color,
            secondary_color: row.secondary_color,
            whatsapp: row.whatsapp,
            status: row.status,
            rejection_reason: row.rejection_reason,
            trial_ends_at: row.trial_ends_at,
            access_code: row.access_code,
            plain_password: row.plain_password,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Inputs
// =============================================================================

/// Fields for a new store. Status always starts as `pending`.
#[derive(Debug, Clone)]
pub struct NewStore {
    pub user_id: Option<PlatformUserId>,
    pub name: String,
    pub slug: String,
    pub owner_email: Email,
    pub owner_name: String,
    pub owner_whatsapp: String,
    pub cpf_cnpj: Option<String>,
    pub category: Option<String>,
    pub plan: Plan,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub whatsapp: String,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub access_code: String,
}

/// Partial update of a store's profile. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct StoreProfileUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub whatsapp: Option<String>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new pending store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug or access code is taken.
    pub async fn create(&self, store: &NewStore) -> Result<Store, RepositoryError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "INSERT INTO store (user_id, name, slug, owner_email, owner_name, owner_whatsapp, \
                 cpf_cnpj, category, plan, logo_url, primary_color, secondary_color, whatsapp, \
                 status, trial_ends_at, access_code, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, \
                 COALESCE($11, '#0F766E'), COALESCE($12, '#F59E0B'), $13, \
                 'pending', $14, $15, $16, $16) \
             RETURNING {STORE_COLUMNS}"
        ))
        .bind(store.user_id.map_or(0, |id| id.as_i64()))
        .bind(&store.name)
        .bind(&store.slug)
        .bind(store.owner_email.as_str())
        .bind(&store.owner_name)
        .bind(&store.owner_whatsapp)
        .bind(&store.cpf_cnpj)
        .bind(&store.category)
        .bind(store.plan)
        .bind(&store.logo_url)
        .bind(&store.primary_color)
        .bind(&store.secondary_color)
        .bind(&store.whatsapp)
        .bind(store.trial_ends_at)
        .bind(&store.access_code)
        .bind(now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "slug already in use"))?;

        row.try_into()
    }

    /// Get a store by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM store WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a store by its slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM store WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Whether any store already uses `slug`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn slug_exists(&self, slug: &str) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM store WHERE slug = $1)")
            .bind(slug)
            .fetch_one(self.pool)
            .await?;
        Ok(exists)
    }

    /// List every store, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM store ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List the stores owned by a legacy platform user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_user(&self, user_id: PlatformUserId) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM store WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Whether a pending store is registered under `email`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_pending_for_email(&self, email: &Email) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM store WHERE owner_email = $1 AND status = 'pending')",
        )
        .bind(email.as_str())
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Apply a partial profile update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store does not exist.
    pub async fn update_profile(
        &self,
        id: StoreId,
        update: &StoreProfileUpdate,
    ) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "UPDATE store SET \
                 name = COALESCE($1, name), \
                 category = COALESCE($2, category), \
                 logo_url = COALESCE($3, logo_url), \
                 primary_color = COALESCE($4, primary_color), \
                 secondary_color = COALESCE($5, secondary_color), \
                 whatsapp = COALESCE($6, whatsapp), \
                 updated_at = $7 \
             WHERE id = $8 \
             RETURNING {STORE_COLUMNS}"
        ))
        .bind(&update.name)
        .bind(&update.category)
        .bind(&update.logo_url)
        .bind(&update.primary_color)
        .bind(&update.secondary_color)
        .bind(&update.whatsapp)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Approve a store and provision its owner credential atomically.
    ///
    /// Inside one transaction: refuse if a credential already exists or the
    /// status is not approvable, insert the credential, then flip the store to
    /// `approved`, clear the rejection reason and escrow the password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store does not exist.
    /// Returns `RepositoryError::Conflict` if the store already has a
    /// credential or cannot be approved from its current status.
    pub async fn approve(
        &self,
        id: StoreId,
        password_hash: &str,
        plain_password: &str,
    ) -> Result<Store, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, (String, StoreStatus)>(
            "SELECT owner_email, status FROM store WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((owner_email, status)) = current else {
            return Err(RepositoryError::NotFound);
        };

        let has_credential: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM store_credential WHERE store_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if has_credential {
            return Err(RepositoryError::Conflict(
                "store already has owner credentials".to_owned(),
            ));
        }
        if !status.can_approve() {
            return Err(RepositoryError::Conflict(format!(
                "store cannot be approved from status {status}"
            )));
        }

        let now = Utc::now();
        sqlx::query(
            "INSERT INTO store_credential (store_id, email, password_hash, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $4)",
        )
        .bind(id)
        .bind(&owner_email)
        .bind(password_hash)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "store already has owner credentials"))?;

        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "UPDATE store SET status = 'approved', rejection_reason = NULL, \
                 plain_password = $1, updated_at = $2 \
             WHERE id = $3 \
             RETURNING {STORE_COLUMNS}"
        ))
        .bind(plain_password)
        .bind(now)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        row.try_into()
    }

    /// Mark a store as rejected with a reason. Accepted from any status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store does not exist.
    pub async fn reject(&self, id: StoreId, reason: &str) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "UPDATE store SET status = 'rejected', rejection_reason = $1, updated_at = $2 \
             WHERE id = $3 \
             RETURNING {STORE_COLUMNS}"
        ))
        .bind(reason)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Drop the escrowed password once it no longer matches the credential.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear_plain_password(&self, id: StoreId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE store SET plain_password = NULL, updated_at = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Delete a store and every row that belongs to it in one transaction.
    ///
    /// Children are removed explicitly, deepest first; the `ON DELETE CASCADE`
    /// foreign keys only back this up.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store does not exist.
    pub async fn delete_cascade(&self, id: StoreId) -> Result<(), RepositoryError> {
        self.delete_with_children(id, false).await
    }

    /// Like [`Self::delete_cascade`], but only while the store is rejected.
    ///
    /// The status is checked by the final `DELETE` inside the transaction, so
    /// an approval that commits first leaves the store and its rows intact.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store does not exist and
    /// `RepositoryError::Conflict` if it is not rejected.
    pub async fn delete_rejected_cascade(&self, id: StoreId) -> Result<(), RepositoryError> {
        self.delete_with_children(id, true).await
    }

    async fn delete_with_children(
        &self,
        id: StoreId,
        rejected_only: bool,
    ) -> Result<(), RepositoryError> {
        const CHILD_TABLES: [&str; 7] = [
            "sale",
            "affiliate",
            "coupon",
            "tracking_link",
            "store_order",
            "product",
            "store_credential",
        ];

        let mut tx = self.pool.begin().await?;

        for table in CHILD_TABLES {
            sqlx::query(&format!("DELETE FROM {table} WHERE store_id = $1"))
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        let delete_store = if rejected_only {
            "DELETE FROM store WHERE id = $1 AND status = 'rejected'"
        } else {
            "DELETE FROM store WHERE id = $1"
        };
        let result = sqlx::query(delete_store).bind(id).execute(&mut *tx).await?;

        if result.rows_affected() == 0 {
            // Dropping `tx` rolls the child deletes back.
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM store WHERE id = $1)")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;
            return Err(if exists {
                RepositoryError::Conflict("store is not rejected".to_owned())
            } else {
                RepositoryError::NotFound
            });
        }

        tx.commit().await?;
        Ok(())
    }
}

//! Affiliate repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use vitrine_core::{AffiliateId, AffiliateStatus, Email, StoreId};

use super::RepositoryError;
use crate::models::Affiliate;

const AFFILIATE_COLUMNS: &str = "id, store_id, name, email, whatsapp, commission_percentage, \
     affiliate_code, total_clicks, total_sales, total_commission, status, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct AffiliateRow {
    id: i64,
    store_id: i64,
    name: String,
    email: String,
    whatsapp: Option<String>,
    commission_percentage: i64,
    affiliate_code: String,
    total_clicks: i64,
    total_sales: i64,
    total_commission: i64,
    status: AffiliateStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AffiliateRow> for Affiliate {
    type Error = RepositoryError;

    fn try_from(row: AffiliateRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid affiliate email {}: {e}", row.id))
        })?;

        Ok(Self {
            id: AffiliateId::new(row.id),
            store_id: StoreId::new(row.store_id),
            name: row.name,
            email,
            whatsapp: row.whatsapp,
            commission_percentage: row.commission_percentage,
            affiliate_code: row.affiliate_code,
            total_clicks: row.total_clicks,
            total_sales: row.total_sales,
            total_commission: row.total_commission,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Fields for a new affiliate.
#[derive(Debug, Clone)]
pub struct NewAffiliate {
    pub store_id: StoreId,
    pub name: String,
    pub email: Email,
    pub whatsapp: Option<String>,
    pub commission_percentage: i64,
    pub affiliate_code: String,
    pub status: AffiliateStatus,
}

/// Repository for affiliate database operations.
pub struct AffiliateRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AffiliateRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new affiliate with zeroed counters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the affiliate code is taken.
    pub async fn create(&self, affiliate: &NewAffiliate) -> Result<Affiliate, RepositoryError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, AffiliateRow>(&format!(
            "INSERT INTO affiliate (store_id, name, email, whatsapp, commission_percentage, \
                 affiliate_code, total_clicks, total_sales, total_commission, status, \
                 created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, 0, 0, 0, $7, $8, $8) \
             RETURNING {AFFILIATE_COLUMNS}"
        ))
        .bind(affiliate.store_id)
        .bind(&affiliate.name)
        .bind(affiliate.email.as_str())
        .bind(&affiliate.whatsapp)
        .bind(affiliate.commission_percentage)
        .bind(&affiliate.affiliate_code)
        .bind(affiliate.status)
        .bind(now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "affiliate code already exists"))?;

        row.try_into()
    }

    /// Get an affiliate by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: AffiliateId) -> Result<Option<Affiliate>, RepositoryError> {
        let row = sqlx::query_as::<_, AffiliateRow>(&format!(
            "SELECT {AFFILIATE_COLUMNS} FROM affiliate WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get an affiliate by its globally unique code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Affiliate>, RepositoryError> {
        let row = sqlx::query_as::<_, AffiliateRow>(&format!(
            "SELECT {AFFILIATE_COLUMNS} FROM affiliate WHERE affiliate_code = $1"
        ))
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List a store's affiliates, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_store(&self, store_id: StoreId) -> Result<Vec<Affiliate>, RepositoryError> {
        let rows = sqlx::query_as::<_, AffiliateRow>(&format!(
            "SELECT {AFFILIATE_COLUMNS} FROM affiliate WHERE store_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Number of `active` affiliates of a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_active(&self, store_id: StoreId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM affiliate WHERE store_id = $1 AND status = 'active'",
        )
        .bind(store_id)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Persist the editable fields of `affiliate`. Counters are untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the affiliate does not exist.
    pub async fn update(&self, affiliate: &Affiliate) -> Result<Affiliate, RepositoryError> {
        let row = sqlx::query_as::<_, AffiliateRow>(&format!(
            "UPDATE affiliate SET name = $1, email = $2, whatsapp = $3, \
                 commission_percentage = $4, status = $5, updated_at = $6 \
             WHERE id = $7 \
             RETURNING {AFFILIATE_COLUMNS}"
        ))
        .bind(&affiliate.name)
        .bind(affiliate.email.as_str())
        .bind(&affiliate.whatsapp)
        .bind(affiliate.commission_percentage)
        .bind(affiliate.status)
        .bind(Utc::now())
        .bind(affiliate.id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Atomically count a click for an active affiliate.
    ///
    /// Returns whether an active affiliate with this code exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn record_click(&self, code: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE affiliate SET total_clicks = total_clicks + 1 \
             WHERE affiliate_code = $1 AND status = 'active'",
        )
        .bind(code)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete an affiliate. Its sales keep their snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the affiliate does not exist.
    pub async fn delete(&self, id: AffiliateId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM affiliate WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

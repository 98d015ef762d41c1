//! Coupon repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use vitrine_core::{ActivationStatus, Cents, CouponId, CouponType, StoreId};

use super::RepositoryError;
use crate::models::Coupon;

const COUPON_COLUMNS: &str = "id, store_id, code, type, value, min_purchase, max_uses, \
     current_uses, valid_from, valid_until, status, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    id: i64,
    store_id: i64,
    code: String,
    #[sqlx(rename = "type")]
    kind: CouponType,
    value: i64,
    min_purchase: i64,
    max_uses: i64,
    current_uses: i64,
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
    status: ActivationStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CouponRow> for Coupon {
    fn from(row: CouponRow) -> Self {
        Self {
            id: CouponId::new(row.id),
            store_id: StoreId::new(row.store_id),
            code: row.code,
            kind: row.kind,
            value: row.value,
            min_purchase: row.min_purchase,
            max_uses: row.max_uses,
            current_uses: row.current_uses,
            valid_from: row.valid_from,
            valid_until: row.valid_until,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Fields for a new coupon. `code` must already be normalized.
#[derive(Debug, Clone)]
pub struct NewCoupon {
    pub store_id: StoreId,
    pub code: String,
    pub kind: CouponType,
    pub value: i64,
    pub min_purchase: Cents,
    pub max_uses: i64,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

/// Repository for coupon database operations.
pub struct CouponRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CouponRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new active coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the store already has this code.
    pub async fn create(&self, coupon: &NewCoupon) -> Result<Coupon, RepositoryError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "INSERT INTO coupon (store_id, code, type, value, min_purchase, max_uses, \
                 current_uses, valid_from, valid_until, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, 0, $7, $8, 'active', $9, $9) \
             RETURNING {COUPON_COLUMNS}"
        ))
        .bind(coupon.store_id)
        .bind(&coupon.code)
        .bind(coupon.kind)
        .bind(coupon.value)
        .bind(coupon.min_purchase)
        .bind(coupon.max_uses)
        .bind(coupon.valid_from)
        .bind(coupon.valid_until)
        .bind(now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "coupon code already exists"))?;

        Ok(row.into())
    }

    /// Get a coupon by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CouponId) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupon WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Look up a coupon by its exact code within a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(
        &self,
        store_id: StoreId,
        code: &str,
    ) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupon WHERE store_id = $1 AND code = $2"
        ))
        .bind(store_id)
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List a store's coupons, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_store(&self, store_id: StoreId) -> Result<Vec<Coupon>, RepositoryError> {
        let rows = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupon WHERE store_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Persist every editable field of `coupon`. Usage counts are untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the coupon does not exist.
    /// Returns `RepositoryError::Conflict` if the new code clashes.
    pub async fn update(&self, coupon: &Coupon) -> Result<Coupon, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "UPDATE coupon SET code = $1, type = $2, value = $3, min_purchase = $4, \
                 max_uses = $5, valid_from = $6, valid_until = $7, status = $8, updated_at = $9 \
             WHERE id = $10 \
             RETURNING {COUPON_COLUMNS}"
        ))
        .bind(&coupon.code)
        .bind(coupon.kind)
        .bind(coupon.value)
        .bind(coupon.min_purchase)
        .bind(coupon.max_uses)
        .bind(coupon.valid_from)
        .bind(coupon.valid_until)
        .bind(coupon.status)
        .bind(Utc::now())
        .bind(coupon.id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "coupon code already exists"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the coupon does not exist.
    pub async fn delete(&self, id: CouponId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM coupon WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

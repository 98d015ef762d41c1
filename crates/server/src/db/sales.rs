//! Sale repository: immutable attribution records.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use vitrine_core::{AffiliateId, Cents, OrderId, SaleId, StoreId};

use super::RepositoryError;
use crate::models::Sale;

const SALE_COLUMNS: &str = "id, store_id, order_id, affiliate_code, affiliate_id, tracking_link, \
     sale_value, commission_percentage, commission_value, customer_email, created_at";

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: i64,
    store_id: i64,
    order_id: i64,
    affiliate_code: Option<String>,
    affiliate_id: Option<i64>,
    tracking_link: Option<String>,
    sale_value: i64,
    commission_percentage: i64,
    commission_value: i64,
    customer_email: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<SaleRow> for Sale {
    fn from(row: SaleRow) -> Self {
        Self {
            id: SaleId::new(row.id),
            store_id: StoreId::new(row.store_id),
            order_id: OrderId::new(row.order_id),
            affiliate_code: row.affiliate_code,
            affiliate_id: row.affiliate_id.map(AffiliateId::new),
            tracking_link: row.tracking_link,
            sale_value: row.sale_value,
            commission_percentage: row.commission_percentage,
            commission_value: row.commission_value,
            customer_email: row.customer_email,
            created_at: row.created_at,
        }
    }
}

/// An attributed sale to record.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub store_id: StoreId,
    pub order_id: OrderId,
    pub affiliate_id: AffiliateId,
    pub affiliate_code: String,
    pub tracking_link: Option<String>,
    pub sale_value: Cents,
    pub commission_percentage: i64,
    pub commission_value: Cents,
    pub customer_email: Option<String>,
}

/// Repository for sale database operations.
pub struct SaleRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SaleRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a sale and credit its affiliate in one transaction.
    ///
    /// The affiliate counters move with `col = col + n`, so concurrent
    /// attributions never lose an increment, and the sale is never visible
    /// without the matching counter update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the affiliate disappeared.
    pub async fn record_attributed(&self, sale: &NewSale) -> Result<Sale, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, SaleRow>(&format!(
            "INSERT INTO sale (store_id, order_id, affiliate_code, affiliate_id, tracking_link, \
                 sale_value, commission_percentage, commission_value, customer_email, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {SALE_COLUMNS}"
        ))
        .bind(sale.store_id)
        .bind(sale.order_id)
        .bind(&sale.affiliate_code)
        .bind(sale.affiliate_id)
        .bind(&sale.tracking_link)
        .bind(sale.sale_value)
        .bind(sale.commission_percentage)
        .bind(sale.commission_value)
        .bind(&sale.customer_email)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        let credited = sqlx::query(
            "UPDATE affiliate SET total_sales = total_sales + 1, \
                 total_commission = total_commission + $1 \
             WHERE id = $2",
        )
        .bind(sale.commission_value)
        .bind(sale.affiliate_id)
        .execute(&mut *tx)
        .await?;
        if credited.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;

        Ok(row.into())
    }

    /// List a store's sales, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_store(&self, store_id: StoreId) -> Result<Vec<Sale>, RepositoryError> {
        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {SALE_COLUMNS} FROM sale WHERE store_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List the sales attributed to one affiliate, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_affiliate(
        &self,
        affiliate_id: AffiliateId,
    ) -> Result<Vec<Sale>, RepositoryError> {
        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {SALE_COLUMNS} FROM sale WHERE affiliate_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(affiliate_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

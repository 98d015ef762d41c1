//! Order repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::types::Json;

use vitrine_core::{Cents, CouponId, OrderId, OrderStatus, StoreId};

use super::RepositoryError;
use crate::models::{CustomerAddress, Order, OrderItem};

/// Conflict message for a colliding order number; callers may retry.
pub const DUPLICATE_ORDER_NUMBER: &str = "order number already exists";

const ORDER_COLUMNS: &str = "id, store_id, order_number, customer_name, customer_email, \
     customer_phone, customer_address, items, subtotal, discount, shipping, total, status, \
     payment_method, shipping_method, notes, coupon_code, affiliate_code, tracking_link, source, \
     created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    store_id: i64,
    order_number: String,
    customer_name: String,
    customer_email: Option<String>,
    customer_phone: String,
    customer_address: Option<Json<CustomerAddress>>,
    items: Json<Vec<OrderItem>>,
    subtotal: i64,
    discount: i64,
    shipping: i64,
    total: i64,
    status: OrderStatus,
    payment_method: Option<String>,
    shipping_method: Option<String>,
    notes: Option<String>,
    coupon_code: Option<String>,
    affiliate_code: Option<String>,
    tracking_link: Option<String>,
    source: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            store_id: StoreId::new(row.store_id),
            order_number: row.order_number,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            customer_phone: row.customer_phone,
            customer_address: row.customer_address.map(|a| a.0),
            items: row.items.0,
            subtotal: row.subtotal,
            discount: row.discount,
            shipping: row.shipping,
            total: row.total,
            status: row.status,
            payment_method: row.payment_method,
            shipping_method: row.shipping_method,
            notes: row.notes,
            coupon_code: row.coupon_code,
            affiliate_code: row.affiliate_code,
            tracking_link: row.tracking_link,
            source: row.source,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A validated order ready to be stored.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub store_id: StoreId,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: String,
    pub customer_address: Option<CustomerAddress>,
    pub items: Vec<OrderItem>,
    pub subtotal: Cents,
    pub discount: Cents,
    pub shipping: Cents,
    pub total: Cents,
    pub payment_method: Option<String>,
    pub shipping_method: Option<String>,
    pub notes: Option<String>,
    pub coupon_code: Option<String>,
    pub affiliate_code: Option<String>,
    pub tracking_link: Option<String>,
    pub source: Option<String>,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert an order, redeeming `coupon` in the same transaction.
    ///
    /// The redemption is a guarded `current_uses + 1` that only succeeds while
    /// the coupon is active and below its usage cap, so concurrent checkouts
    /// can never push a coupon past `max_uses`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the coupon can no longer be
    /// redeemed or the order number is taken.
    pub async fn create(
        &self,
        order: &NewOrder,
        coupon: Option<CouponId>,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        if let Some(coupon_id) = coupon {
            let redeemed = sqlx::query(
                "UPDATE coupon SET current_uses = current_uses + 1, updated_at = $1 \
                 WHERE id = $2 AND status = 'active' \
                   AND (max_uses = 0 OR current_uses < max_uses)",
            )
            .bind(now)
            .bind(coupon_id)
            .execute(&mut *tx)
            .await?;

            if redeemed.rows_affected() == 0 {
                return Err(RepositoryError::Conflict(
                    "coupon usage limit reached".to_owned(),
                ));
            }
        }

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO store_order (store_id, order_number, customer_name, customer_email, \
                 customer_phone, customer_address, items, subtotal, discount, shipping, total, \
                 status, payment_method, shipping_method, notes, coupon_code, affiliate_code, \
                 tracking_link, source, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'new', $12, $13, $14, $15, \
                 $16, $17, $18, $19, $19) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.store_id)
        .bind(&order.order_number)
        .bind(&order.customer_name)
        .bind(&order.customer_email)
        .bind(&order.customer_phone)
        .bind(order.customer_address.as_ref().map(Json))
        .bind(Json(&order.items))
        .bind(order.subtotal)
        .bind(order.discount)
        .bind(order.shipping)
        .bind(order.total)
        .bind(&order.payment_method)
        .bind(&order.shipping_method)
        .bind(&order.notes)
        .bind(&order.coupon_code)
        .bind(&order.affiliate_code)
        .bind(&order.tracking_link)
        .bind(&order.source)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique(e, DUPLICATE_ORDER_NUMBER))?;

        tx.commit().await?;

        Ok(row.into())
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM store_order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List a store's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_store(&self, store_id: StoreId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM store_order WHERE store_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Move an order from `from` to `to`.
    ///
    /// The update is conditional on the current status so two concurrent
    /// transitions cannot both succeed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the status changed in between.
    pub async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE store_order SET status = $1, updated_at = $2 \
             WHERE id = $3 AND status = $4 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(to)
        .bind(Utc::now())
        .bind(id)
        .bind(from)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| RepositoryError::Conflict("order status changed concurrently".to_owned()))?;

        Ok(row.into())
    }
}

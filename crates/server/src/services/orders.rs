//! Checkout and order fulfillment.
//!
//! Totals sent by the buyer are re-verified, and any coupon is re-validated
//! and redeemed in the same transaction as the order insert. Affiliate
//! attribution and tracking-link conversions happen after commit and can
//! never fail the order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::instrument;

use vitrine_core::{Cents, OrderId, OrderStatus, StoreId};

use super::affiliates::AffiliateService;
use super::codes::generate_order_number;
use super::coupons::CouponValidator;
use super::sessions::StoreOwner;
use super::stores::StoreService;
use super::{optional, required};
use crate::db::{
    DUPLICATE_ORDER_NUMBER, NewOrder, OrderRepository, RepositoryError, TrackingLinkRepository,
};
use crate::error::AppError;
use crate::models::{CustomerAddress, Order, OrderItem};

/// Order numbers drawn before giving up.
const MAX_ORDER_NUMBER_ATTEMPTS: usize = 3;

/// Checkout form submitted by a buyer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    pub store_id: StoreId,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: String,
    pub customer_address: Option<CustomerAddress>,
    pub items: Vec<OrderItem>,
    pub subtotal: Cents,
    #[serde(default)]
    pub discount: Cents,
    #[serde(default)]
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

/// Result of a successful checkout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub id: OrderId,
    pub order_number: String,
}

/// Order service.
pub struct OrderService<'a> {
    pool: &'a SqlitePool,
    orders: OrderRepository<'a>,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            pool,
            orders: OrderRepository::new(pool),
        }
    }

    /// Place an order on an approved store.
    ///
    /// The coupon discount is capped at the subtotal, so a fixed coupon worth
    /// more than the cart still applies.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` unless the store is approved,
    /// `AppError::BadRequest` if the totals or coupon discount do not add up
    /// or the coupon is not valid, and `AppError::Conflict` if the coupon ran
    /// out while the order was being placed.
    #[instrument(skip(self, input, now), fields(store_id = %input.store_id))]
    pub async fn create(
        &self,
        input: OrderInput,
        now: DateTime<Utc>,
    ) -> Result<CreatedOrder, AppError> {
        let store = StoreService::new(self.pool).get_approved(input.store_id).await?;

        verify_totals(
            &input.items,
            input.subtotal,
            input.discount,
            input.shipping,
            input.total,
        )?;

        let coupon_code = input.coupon_code.filter(|code| !code.is_empty());
        let coupon_id = match &coupon_code {
            Some(code) => {
                let validation = CouponValidator::new(self.pool)
                    .validate(store.id, code, input.subtotal, now)
                    .await
                    .map_err(|e| match e {
                        AppError::NotFound(_) => {
                            AppError::BadRequest(format!("coupon {code} not found"))
                        }
                        other => other,
                    })?;
                // A fixed coupon worth more than the cart only zeroes the subtotal.
                let expected = validation.discount_amount.min(input.subtotal);
                if expected != input.discount {
                    return Err(AppError::BadRequest(format!(
                        "discount must be {expected} for coupon {code}"
                    )));
                }
                Some(validation.coupon.id)
            }
            None if input.discount != 0 => {
                return Err(AppError::BadRequest(
                    "discount requires a coupon".to_string(),
                ));
            }
            None => None,
        };

        let mut new_order = NewOrder {
            store_id: store.id,
            order_number: generate_order_number(now),
            customer_name: required("customerName", &input.customer_name)?,
            customer_email: optional(input.customer_email),
            customer_phone: required("customerPhone", &input.customer_phone)?,
            customer_address: input.customer_address,
            items: input.items,
            subtotal: input.subtotal,
            discount: input.discount,
            shipping: input.shipping,
            total: input.total,
            payment_method: optional(input.payment_method),
            shipping_method: optional(input.shipping_method),
            notes: optional(input.notes),
            coupon_code,
            affiliate_code: optional(input.affiliate_code),
            tracking_link: optional(input.tracking_link),
            source: optional(input.source),
        };

        let mut attempt = 1;
        let order = loop {
            match self.orders.create(&new_order, coupon_id).await {
                Ok(order) => break order,
                Err(RepositoryError::Conflict(message))
                    if message == DUPLICATE_ORDER_NUMBER && attempt < MAX_ORDER_NUMBER_ATTEMPTS =>
                {
                    attempt += 1;
                    new_order.order_number = generate_order_number(Utc::now());
                }
                Err(e) => return Err(e.into()),
            }
        };

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = order.total,
            "Order placed"
        );

        self.after_commit(&order).await;

        Ok(CreatedOrder {
            id: order.id,
            order_number: order.order_number,
        })
    }

    /// Side effects that must not fail a committed order.
    async fn after_commit(&self, order: &Order) {
        AffiliateService::new(self.pool)
            .attribute_on_order(order)
            .await;

        if let Some(slug) = order.tracking_link.as_deref() {
            match TrackingLinkRepository::new(self.pool)
                .record_conversion(order.store_id, slug)
                .await
            {
                Ok(true) => tracing::debug!(slug, "Tracking link conversion recorded"),
                Ok(false) => tracing::debug!(slug, "Order names no active tracking link"),
                Err(e) => tracing::error!(error = %e, slug, "Failed to record conversion"),
            }
        }
    }

    /// Every order of the owner's store, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list(&self, owner: &StoreOwner) -> Result<Vec<Order>, AppError> {
        Ok(self.orders.list_by_store(owner.store_id).await?)
    }

    /// Load one of the owner's orders.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` or `AppError::Forbidden` for another store.
    pub async fn get(&self, owner: &StoreOwner, id: OrderId) -> Result<Order, AppError> {
        let order = self
            .orders
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;
        owner.ensure_store(order.store_id)?;
        Ok(order)
    }

    /// Move an order along the fulfillment state machine.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get`], plus `AppError::BadRequest` for an illegal
    /// transition and `AppError::Conflict` if the status changed meanwhile.
    #[instrument(skip(self, owner), fields(store_id = %owner.store_id))]
    pub async fn update_status(
        &self,
        owner: &StoreOwner,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, AppError> {
        let order = self.get(owner, id).await?;

        if !order.status.can_transition_to(status) {
            return Err(AppError::BadRequest(format!(
                "cannot move order from {} to {status}",
                order.status
            )));
        }

        let order = self.orders.update_status(id, order.status, status).await?;
        tracing::info!(order_id = %id, status = %order.status, "Order status updated");
        Ok(order)
    }
}

/// Check that line totals, subtotal and total are consistent.
///
/// # Errors
///
/// Returns `AppError::BadRequest` describing the first inconsistency.
pub fn verify_totals(
    items: &[OrderItem],
    subtotal: Cents,
    discount: Cents,
    shipping: Cents,
    total: Cents,
) -> Result<(), AppError> {
    if items.is_empty() {
        return Err(AppError::BadRequest("order has no items".to_string()));
    }

    let mut sum: Cents = 0;
    for item in items {
        if item.quantity <= 0 {
            return Err(AppError::BadRequest(format!(
                "quantity of {} must be positive",
                item.product_name
            )));
        }
        if item.price < 0 {
            return Err(AppError::BadRequest(format!(
                "price of {} must not be negative",
                item.product_name
            )));
        }
        if item.price.checked_mul(item.quantity) != Some(item.total) {
            return Err(AppError::BadRequest(format!(
                "line total of {} does not match price times quantity",
                item.product_name
            )));
        }
        sum = sum
            .checked_add(item.total)
            .ok_or_else(|| AppError::BadRequest("order subtotal is too large".to_string()))?;
    }

    if sum != subtotal {
        return Err(AppError::BadRequest(
            "subtotal does not match the line totals".to_string(),
        ));
    }
    if discount < 0 || shipping < 0 {
        return Err(AppError::BadRequest(
            "discount and shipping must not be negative".to_string(),
        ));
    }

    let expected = subtotal
        .checked_sub(discount)
        .and_then(|v| v.checked_add(shipping));
    if expected != Some(total) {
        return Err(AppError::BadRequest(
            "total must equal subtotal - discount + shipping".to_string(),
        ));
    }
    if total < 0 {
        return Err(AppError::BadRequest("total must not be negative".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use vitrine_core::ProductId;

    use super::*;

    fn item(price: Cents, quantity: i64) -> OrderItem {
        OrderItem {
            product_id: ProductId::new(1),
            product_name: "Camiseta".to_string(),
            quantity,
            price,
            total: price * quantity,
        }
    }

    #[test]
    fn test_consistent_totals() {
        let items = [item(2_500, 2), item(1_000, 1)];
        assert!(verify_totals(&items, 6_000, 600, 1_500, 6_900).is_ok());
        assert!(verify_totals(&items, 6_000, 0, 0, 6_000).is_ok());
    }

    #[test]
    fn test_rejects_wrong_total() {
        let items = [item(2_500, 2)];
        assert!(verify_totals(&items, 5_000, 0, 0, 4_999).is_err());
        assert!(verify_totals(&items, 5_000, 100, 0, 5_000).is_err());
    }

    #[test]
    fn test_rejects_wrong_subtotal_and_lines() {
        assert!(verify_totals(&[item(2_500, 2)], 4_000, 0, 0, 4_000).is_err());

        let mut bad_line = item(2_500, 2);
        bad_line.total = 2_500;
        assert!(verify_totals(&[bad_line], 2_500, 0, 0, 2_500).is_err());

        assert!(verify_totals(&[item(2_500, 0)], 0, 0, 0, 0).is_err());
        assert!(verify_totals(&[], 0, 0, 0, 0).is_err());
    }

    #[test]
    fn test_rejects_negative_amounts() {
        let items = [item(1_000, 1)];
        assert!(verify_totals(&items, 1_000, -100, 0, 1_100).is_err());
        assert!(verify_totals(&items, 1_000, 2_000, 0, -1_000).is_err());
    }
}

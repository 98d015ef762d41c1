//! Checkout and order management endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;

use vitrine_core::{OrderId, OrderStatus, StoreId};

use crate::error::AppError;
use crate::middleware::StoreOwnerSession;
use crate::models::Order;
use crate::services::{CreatedOrder, OrderInput, OrderService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: OrderStatus,
}

/// Place an order.
///
/// POST /api/public/orders
///
/// # Errors
///
/// Returns `NotFound` for a store that is not approved, `BadRequest` for
/// inconsistent totals or an invalid coupon and `Conflict` if the coupon
/// ran out during checkout.
pub async fn create(
    State(state): State<AppState>,
    Json(form): Json<OrderInput>,
) -> Result<(StatusCode, Json<CreatedOrder>), AppError> {
    let created = OrderService::new(state.pool())
        .create(form, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/stores/{id}/orders
///
/// # Errors
///
/// Returns `Forbidden` for another store.
pub async fn list(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Path(store_id): Path<StoreId>,
) -> Result<Json<Vec<Order>>, AppError> {
    owner.ensure_store(store_id)?;
    Ok(Json(OrderService::new(state.pool()).list(&owner).await?))
}

/// GET /api/orders/{id}
///
/// # Errors
///
/// Returns `NotFound`, or `Forbidden` for an order of another store.
pub async fn get(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(OrderService::new(state.pool()).get(&owner, id).await?))
}

/// POST /api/orders/{id}/status
///
/// # Errors
///
/// Same as [`get`], plus `BadRequest` for an illegal transition.
pub async fn update_status(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Path(id): Path<OrderId>,
    Json(change): Json<StatusChange>,
) -> Result<Json<Order>, AppError> {
    let order = OrderService::new(state.pool())
        .update_status(&owner, id, change.status)
        .await?;
    Ok(Json(order))
}

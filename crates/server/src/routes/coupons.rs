//! Coupon endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;

use vitrine_core::{Cents, CouponId, StoreId};

use crate::error::AppError;
use crate::middleware::StoreOwnerSession;
use crate::models::Coupon;
use crate::services::{CouponInput, CouponService, CouponUpdate, CouponValidation, CouponValidator};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub store_id: StoreId,
    pub code: String,
    pub purchase_amount: Cents,
}

/// POST /api/stores/{id}/coupons
///
/// # Errors
///
/// Returns `Forbidden` for another store or a plan without coupons,
/// `BadRequest` for invalid terms and `Conflict` for a duplicate code.
pub async fn create(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Path(store_id): Path<StoreId>,
    Json(form): Json<CouponInput>,
) -> Result<(StatusCode, Json<Coupon>), AppError> {
    owner.ensure_store(store_id)?;
    let coupon = CouponService::new(state.pool()).create(&owner, form).await?;
    Ok((StatusCode::CREATED, Json(coupon)))
}

/// GET /api/stores/{id}/coupons
///
/// # Errors
///
/// Returns `Forbidden` for another store or a plan without coupons.
pub async fn list(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Path(store_id): Path<StoreId>,
) -> Result<Json<Vec<Coupon>>, AppError> {
    owner.ensure_store(store_id)?;
    Ok(Json(CouponService::new(state.pool()).list(&owner).await?))
}

/// PATCH /api/coupons/{id}
///
/// # Errors
///
/// Returns `NotFound`, `Forbidden` for another store and `BadRequest` for
/// invalid terms.
pub async fn update(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Path(id): Path<CouponId>,
    Json(update): Json<CouponUpdate>,
) -> Result<Json<Coupon>, AppError> {
    let coupon = CouponService::new(state.pool())
        .update(&owner, id, update)
        .await?;
    Ok(Json(coupon))
}

/// DELETE /api/coupons/{id}
///
/// # Errors
///
/// Returns `NotFound`, or `Forbidden` for another store.
pub async fn delete(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Path(id): Path<CouponId>,
) -> Result<StatusCode, AppError> {
    CouponService::new(state.pool()).delete(&owner, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Check a coupon at checkout without redeeming it.
///
/// POST /api/public/coupons/validate
///
/// # Errors
///
/// Returns `NotFound` for an unknown code and `BadRequest` naming the
/// failed check.
pub async fn validate(
    State(state): State<AppState>,
    Json(form): Json<ValidateRequest>,
) -> Result<Json<CouponValidation>, AppError> {
    let validation = CouponValidator::new(state.pool())
        .validate(form.store_id, &form.code, form.purchase_amount, Utc::now())
        .await?;
    Ok(Json(validation))
}

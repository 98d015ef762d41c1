//! Affiliate program endpoints, including sales and billing.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

use vitrine_core::{AffiliateBilling, AffiliateId, StoreId};

use crate::error::AppError;
use crate::middleware::StoreOwnerSession;
use crate::models::{Affiliate, PublicAffiliate, Sale};
use crate::services::{AffiliateInput, AffiliateService, AffiliateUpdate, CreatedAffiliate};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ClickResponse {
    pub success: bool,
}

/// POST /api/stores/{id}/affiliates
///
/// # Errors
///
/// Returns `Forbidden` for another store or a plan without affiliates and
/// `BadRequest` for invalid input.
pub async fn create(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Path(store_id): Path<StoreId>,
    Json(form): Json<AffiliateInput>,
) -> Result<(StatusCode, Json<CreatedAffiliate>), AppError> {
    owner.ensure_store(store_id)?;
    let created = AffiliateService::new(state.pool())
        .create(&owner, form)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/stores/{id}/affiliates
///
/// # Errors
///
/// Returns `Forbidden` for another store.
pub async fn list(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Path(store_id): Path<StoreId>,
) -> Result<Json<Vec<Affiliate>>, AppError> {
    owner.ensure_store(store_id)?;
    Ok(Json(AffiliateService::new(state.pool()).list(&owner).await?))
}

/// Active affiliates against the plan's included count.
///
/// GET /api/stores/{id}/affiliates/billing
///
/// # Errors
///
/// Returns `Forbidden` for another store.
pub async fn billing(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Path(store_id): Path<StoreId>,
) -> Result<Json<AffiliateBilling>, AppError> {
    owner.ensure_store(store_id)?;
    Ok(Json(
        AffiliateService::new(state.pool()).billing(&owner).await?,
    ))
}

/// PATCH /api/affiliates/{id}
///
/// # Errors
///
/// Returns `NotFound`, `Forbidden` for another store and `BadRequest` for
/// invalid input.
pub async fn update(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Path(id): Path<AffiliateId>,
    Json(update): Json<AffiliateUpdate>,
) -> Result<Json<Affiliate>, AppError> {
    let affiliate = AffiliateService::new(state.pool())
        .update(&owner, id, update)
        .await?;
    Ok(Json(affiliate))
}

/// POST /api/affiliates/{id}/toggle
///
/// # Errors
///
/// Returns `NotFound`, or `Forbidden` for another store.
pub async fn toggle_status(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Path(id): Path<AffiliateId>,
) -> Result<Json<Affiliate>, AppError> {
    let affiliate = AffiliateService::new(state.pool())
        .toggle_status(&owner, id)
        .await?;
    Ok(Json(affiliate))
}

/// DELETE /api/affiliates/{id}
///
/// # Errors
///
/// Returns `NotFound`, or `Forbidden` for another store.
pub async fn delete(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Path(id): Path<AffiliateId>,
) -> Result<StatusCode, AppError> {
    AffiliateService::new(state.pool()).delete(&owner, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/stores/{id}/sales
///
/// # Errors
///
/// Returns `Forbidden` for another store.
pub async fn list_sales(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Path(store_id): Path<StoreId>,
) -> Result<Json<Vec<Sale>>, AppError> {
    owner.ensure_store(store_id)?;
    Ok(Json(
        AffiliateService::new(state.pool()).list_sales(&owner).await?,
    ))
}

/// GET /api/affiliates/{id}/sales
///
/// # Errors
///
/// Returns `NotFound`, or `Forbidden` for an affiliate of another store.
pub async fn list_sales_by_affiliate(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Path(id): Path<AffiliateId>,
) -> Result<Json<Vec<Sale>>, AppError> {
    let sales = AffiliateService::new(state.pool())
        .list_sales_by_affiliate(&owner, id)
        .await?;
    Ok(Json(sales))
}

/// GET /api/public/affiliates/{code}
///
/// # Errors
///
/// Returns `NotFound` unless the affiliate exists and is active.
pub async fn get_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<PublicAffiliate>, AppError> {
    Ok(Json(
        AffiliateService::new(state.pool())
            .get_public_by_code(&code)
            .await?,
    ))
}

/// Count a referral click. Unknown codes report `success: false`.
///
/// POST /api/public/affiliates/{code}/click
///
/// # Errors
///
/// Returns `Internal` if the counter could not be updated.
pub async fn track_click(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ClickResponse>, AppError> {
    let success = AffiliateService::new(state.pool())
        .track_click(&code)
        .await?;
    Ok(Json(ClickResponse { success }))
}

//! Product catalog endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use vitrine_core::{ProductId, StoreId};

use crate::error::AppError;
use crate::middleware::StoreOwnerSession;
use crate::models::Product;
use crate::services::{ProductInput, ProductService, ProductUpdate};
use crate::state::AppState;

/// POST /api/stores/{id}/products
///
/// # Errors
///
/// Returns `Forbidden` for another store or when the plan does not allow
/// the product, and `BadRequest` for invalid input.
pub async fn create(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Path(store_id): Path<StoreId>,
    Json(form): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    owner.ensure_store(store_id)?;
    let product = ProductService::new(state.pool()).create(&owner, form).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /api/stores/{id}/products
///
/// # Errors
///
/// Returns `Forbidden` for another store.
pub async fn list(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Path(store_id): Path<StoreId>,
) -> Result<Json<Vec<Product>>, AppError> {
    owner.ensure_store(store_id)?;
    Ok(Json(ProductService::new(state.pool()).list(&owner).await?))
}

/// GET /api/products/{id}
///
/// # Errors
///
/// Returns `NotFound`, or `Forbidden` for a product of another store.
pub async fn get(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>, AppError> {
    Ok(Json(ProductService::new(state.pool()).get(&owner, id).await?))
}

/// PATCH /api/products/{id}
///
/// # Errors
///
/// Same as [`get`], plus `BadRequest` and plan `Forbidden` errors.
pub async fn update(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Path(id): Path<ProductId>,
    Json(update): Json<ProductUpdate>,
) -> Result<Json<Product>, AppError> {
    let product = ProductService::new(state.pool())
        .update(&owner, id, update)
        .await?;
    Ok(Json(product))
}

/// DELETE /api/products/{id}
///
/// # Errors
///
/// Same as [`get`].
pub async fn delete(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Path(id): Path<ProductId>,
) -> Result<StatusCode, AppError> {
    ProductService::new(state.pool()).delete(&owner, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Active products of an approved store.
///
/// GET /api/public/stores/{id}/products
///
/// # Errors
///
/// Returns `NotFound` unless the store is approved.
pub async fn list_public(
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(
        ProductService::new(state.pool()).list_public(store_id).await?,
    ))
}

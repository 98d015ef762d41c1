//! Store endpoints for the platform panel and the public storefront.
//!
//! The `/api/stores` endpoints belong to the platform panel and are
//! authorized through the platform user mirrored from an admin session.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use vitrine_core::StoreId;

use crate::error::AppError;
use crate::middleware::{LegacyUser, SessionCookies};
use crate::models::{OwnerStore, PublicStore};
use crate::services::{
    CreatedStore, LegacyStoreInput, RegisteredStore, StoreRegistration, StoreService, StoreUpdate,
};
use crate::state::AppState;

/// Self-register a store. It starts out pending.
///
/// POST /api/public/stores/register
///
/// # Errors
///
/// Returns `BadRequest` for invalid input.
pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<StoreRegistration>,
) -> Result<(StatusCode, Json<RegisteredStore>), AppError> {
    let registered = StoreService::new(state.pool()).register(form).await?;
    Ok((StatusCode::CREATED, Json(registered)))
}

/// Storefront view of an approved store.
///
/// GET /api/public/stores/{slug}
///
/// # Errors
///
/// Returns `NotFound` unless the store exists and is approved.
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PublicStore>, AppError> {
    let store = StoreService::new(state.pool())
        .get_public_by_slug(&slug)
        .await?;
    Ok(Json(PublicStore::from(&store)))
}

/// POST /api/stores
///
/// # Errors
///
/// Returns `BadRequest` for invalid input and `Conflict` for a taken slug.
pub async fn create(
    State(state): State<AppState>,
    LegacyUser(user): LegacyUser,
    Json(form): Json<LegacyStoreInput>,
) -> Result<(StatusCode, Json<CreatedStore>), AppError> {
    let created = StoreService::new(state.pool())
        .create_for_user(&user, form)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/stores
///
/// # Errors
///
/// Returns `Unauthorized` without a platform session.
pub async fn list(
    State(state): State<AppState>,
    LegacyUser(user): LegacyUser,
) -> Result<Json<Vec<OwnerStore>>, AppError> {
    let stores = StoreService::new(state.pool()).list_for_user(&user).await?;
    Ok(Json(stores.iter().map(OwnerStore::from).collect()))
}

/// GET /api/stores/{id}
///
/// # Errors
///
/// Returns `NotFound` or `Forbidden` for a store of another user.
pub async fn get(
    State(state): State<AppState>,
    cookies: SessionCookies,
    Path(id): Path<StoreId>,
) -> Result<Json<OwnerStore>, AppError> {
    let (_user, store) = state
        .gate()
        .require_owner_of_legacy_user(cookies.admin.as_deref(), id)
        .await?;
    Ok(Json(OwnerStore::from(&store)))
}

/// PATCH /api/stores/{id}
///
/// # Errors
///
/// Same as [`get`], plus `BadRequest` for invalid fields.
pub async fn update(
    State(state): State<AppState>,
    cookies: SessionCookies,
    Path(id): Path<StoreId>,
    Json(update): Json<StoreUpdate>,
) -> Result<Json<OwnerStore>, AppError> {
    state
        .gate()
        .require_owner_of_legacy_user(cookies.admin.as_deref(), id)
        .await?;
    let store = StoreService::new(state.pool())
        .update_profile(id, update)
        .await?;
    Ok(Json(OwnerStore::from(&store)))
}

/// DELETE /api/stores/{id}
///
/// # Errors
///
/// Same as [`get`].
pub async fn delete(
    State(state): State<AppState>,
    cookies: SessionCookies,
    Path(id): Path<StoreId>,
) -> Result<StatusCode, AppError> {
    state
        .gate()
        .require_owner_of_legacy_user(cookies.admin.as_deref(), id)
        .await?;
    StoreService::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

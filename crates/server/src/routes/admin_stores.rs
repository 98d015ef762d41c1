//! Store review queue for platform admins.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use vitrine_core::StoreId;

use crate::error::AppError;
use crate::middleware::AdminSession;
use crate::models::AdminStore;
use crate::services::StoreService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

/// GET /api/admin/stores
///
/// # Errors
///
/// Returns `Unauthorized` without an admin session.
pub async fn list_all(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
) -> Result<Json<Vec<AdminStore>>, AppError> {
    let stores = StoreService::new(state.pool()).list_all().await?;
    Ok(Json(stores.iter().map(AdminStore::from).collect()))
}

/// GET /api/admin/stores/{id}
///
/// # Errors
///
/// Returns `NotFound` for an unknown store.
pub async fn get(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(id): Path<StoreId>,
) -> Result<Json<AdminStore>, AppError> {
    let store = StoreService::new(state.pool()).get(id).await?;
    Ok(Json(AdminStore::from(&store)))
}

/// Approve a pending store and issue its owner credential.
///
/// POST /api/admin/stores/{id}/approve
///
/// # Errors
///
/// Returns `BadRequest` for a weak password, `NotFound` for an unknown
/// store and `Conflict` if the store already has a credential.
pub async fn approve(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    Path(id): Path<StoreId>,
    Json(form): Json<ApproveRequest>,
) -> Result<Json<AdminStore>, AppError> {
    let store = StoreService::new(state.pool())
        .approve(id, &form.password)
        .await?;
    tracing::info!(store_id = %id, admin_id = %admin.admin_id, "Store approved by admin");
    Ok(Json(AdminStore::from(&store)))
}

/// POST /api/admin/stores/{id}/reject
///
/// # Errors
///
/// Returns `BadRequest` without a reason and `NotFound` for an unknown store.
pub async fn reject(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    Path(id): Path<StoreId>,
    Json(form): Json<RejectRequest>,
) -> Result<Json<AdminStore>, AppError> {
    let store = StoreService::new(state.pool())
        .reject(id, &form.reason)
        .await?;
    tracing::info!(store_id = %id, admin_id = %admin.admin_id, "Store rejected by admin");
    Ok(Json(AdminStore::from(&store)))
}

/// DELETE /api/admin/stores/{id}
///
/// # Errors
///
/// Returns `Forbidden` unless the store is rejected.
pub async fn delete_rejected(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(id): Path<StoreId>,
) -> Result<StatusCode, AppError> {
    StoreService::new(state.pool()).delete_rejected(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

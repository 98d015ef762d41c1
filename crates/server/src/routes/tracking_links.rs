//! Tracking link endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use vitrine_core::{StoreId, TrackingLinkId};

use crate::error::AppError;
use crate::middleware::StoreOwnerSession;
use crate::models::TrackingLink;
use crate::services::{TrackingLinkInput, TrackingLinkService, TrackingLinkUpdate};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickRequest {
    pub store_id: StoreId,
    pub slug: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickResponse {
    pub target_url: String,
}

/// POST /api/stores/{id}/tracking-links
///
/// # Errors
///
/// Returns `Forbidden` for another store or a plan without tracking links,
/// `BadRequest` for invalid input and `Conflict` for a duplicate slug.
pub async fn create(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Path(store_id): Path<StoreId>,
    Json(form): Json<TrackingLinkInput>,
) -> Result<(StatusCode, Json<TrackingLink>), AppError> {
    owner.ensure_store(store_id)?;
    let link = TrackingLinkService::new(state.pool())
        .create(&owner, form)
        .await?;
    Ok((StatusCode::CREATED, Json(link)))
}

/// GET /api/stores/{id}/tracking-links
///
/// # Errors
///
/// Returns `Forbidden` for another store.
pub async fn list(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Path(store_id): Path<StoreId>,
) -> Result<Json<Vec<TrackingLink>>, AppError> {
    owner.ensure_store(store_id)?;
    Ok(Json(
        TrackingLinkService::new(state.pool()).list(&owner).await?,
    ))
}

/// PATCH /api/tracking-links/{id}
///
/// # Errors
///
/// Returns `NotFound`, `Forbidden` for another store and `BadRequest` for
/// an invalid URL.
pub async fn update(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Path(id): Path<TrackingLinkId>,
    Json(update): Json<TrackingLinkUpdate>,
) -> Result<Json<TrackingLink>, AppError> {
    let link = TrackingLinkService::new(state.pool())
        .update(&owner, id, update)
        .await?;
    Ok(Json(link))
}

/// DELETE /api/tracking-links/{id}
///
/// # Errors
///
/// Returns `NotFound`, or `Forbidden` for another store.
pub async fn delete(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Path(id): Path<TrackingLinkId>,
) -> Result<StatusCode, AppError> {
    TrackingLinkService::new(state.pool())
        .delete(&owner, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Count a click and hand back the destination.
///
/// POST /api/public/tracking-links/click
///
/// # Errors
///
/// Returns `NotFound` unless the link exists and is active.
pub async fn click(
    State(state): State<AppState>,
    Json(form): Json<ClickRequest>,
) -> Result<Json<ClickResponse>, AppError> {
    let target_url = TrackingLinkService::new(state.pool())
        .click(form.store_id, &form.slug)
        .await?;
    Ok(Json(ClickResponse { target_url }))
}

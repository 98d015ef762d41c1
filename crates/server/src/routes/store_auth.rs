//! Store owner authentication.

use axum::{
    Json,
    extract::State,
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse},
};
use serde::{Deserialize, Serialize};

use vitrine_core::StoreId;

use super::admin_auth::LoginRequest;
use crate::error::AppError;
use crate::middleware::{
    OptionalStoreSession, STORE_SESSION_COOKIE, SessionCookies, StoreOwnerSession, clear_cookie,
    session_cookie,
};
use crate::services::{StoreAuthService, StoreOwnerProfile};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreLoginResponse {
    pub success: bool,
    pub store_id: StoreId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

/// Log a store owner in and set the session cookie.
///
/// POST /api/store-auth/login
///
/// # Errors
///
/// Returns `Unauthorized` for a wrong email or password and `Forbidden`
/// while the store is not approved.
pub async fn login(
    State(state): State<AppState>,
    Json(form): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let login = StoreAuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await?;

    let cookie = session_cookie(STORE_SESSION_COOKIE, login.token, state.cookie_secure());
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(StoreLoginResponse {
            success: true,
            store_id: login.store_id,
        }),
    ))
}

/// POST /api/store-auth/logout
///
/// # Errors
///
/// Returns `Internal` if the session could not be cleared.
pub async fn logout(
    State(state): State<AppState>,
    cookies: SessionCookies,
) -> Result<impl IntoResponse, AppError> {
    if let Some(token) = cookies.store {
        StoreAuthService::new(state.pool()).logout(&token).await?;
    }

    let cookie = clear_cookie(STORE_SESSION_COOKIE, state.cookie_secure());
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(serde_json::json!({ "success": true })),
    ))
}

/// The logged-in owner's account, or `null`.
///
/// GET /api/store-auth/me
///
/// # Errors
///
/// Returns `Internal` if the store could not be loaded.
pub async fn me(
    State(state): State<AppState>,
    OptionalStoreSession(owner): OptionalStoreSession,
) -> Result<Json<Option<StoreOwnerProfile>>, AppError> {
    let Some(owner) = owner else {
        return Ok(Json(None));
    };
    let profile = StoreAuthService::new(state.pool()).profile(&owner).await?;
    Ok(Json(Some(profile)))
}

/// POST /api/store-auth/password
///
/// # Errors
///
/// Returns `BadRequest` if the current password is wrong or the new one is
/// too weak.
pub async fn update_password(
    State(state): State<AppState>,
    StoreOwnerSession(owner): StoreOwnerSession,
    Json(form): Json<PasswordChange>,
) -> Result<Json<serde_json::Value>, AppError> {
    StoreAuthService::new(state.pool())
        .update_password(&owner, &form.current_password, &form.new_password)
        .await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

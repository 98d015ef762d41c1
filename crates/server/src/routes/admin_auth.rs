//! Platform admin authentication and admin account management.

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse},
};
use serde::{Deserialize, Serialize};

use vitrine_core::{AdminUserId, Email};

use crate::error::AppError;
use crate::middleware::{
    ADMIN_SESSION_COOKIE, AdminSession, OptionalAdminSession, SessionCookies, clear_cookie,
    session_cookie,
};
use crate::models::AdminUser;
use crate::services::AdminAuthService;
use crate::state::AppState;

/// Email and password login form.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The logged-in admin as returned by `login` and `me`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub id: AdminUserId,
    pub email: Email,
    pub name: Option<String>,
}

/// New admin form.
#[derive(Debug, Deserialize)]
pub struct CreateAdminRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// Log an admin in and set the session cookie.
///
/// POST /api/admin/auth/login
///
/// # Errors
///
/// Returns `Unauthorized` for a wrong email or password.
pub async fn login(
    State(state): State<AppState>,
    Json(form): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (admin, token) = AdminAuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await?;

    let cookie = session_cookie(ADMIN_SESSION_COOKIE, token, state.cookie_secure());
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(AdminProfile {
            id: admin.id,
            email: admin.email,
            name: admin.name,
        }),
    ))
}

/// Invalidate the admin session and clear the cookie.
///
/// POST /api/admin/auth/logout
///
/// # Errors
///
/// Returns `Internal` if the session could not be cleared.
pub async fn logout(
    State(state): State<AppState>,
    cookies: SessionCookies,
) -> Result<impl IntoResponse, AppError> {
    if let Some(token) = cookies.admin {
        AdminAuthService::new(state.pool()).logout(&token).await?;
    }

    let cookie = clear_cookie(ADMIN_SESSION_COOKIE, state.cookie_secure());
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(serde_json::json!({ "success": true })),
    ))
}

/// The current admin, or `null`.
///
/// GET /api/admin/auth/me
pub async fn me(OptionalAdminSession(admin): OptionalAdminSession) -> Json<Option<AdminProfile>> {
    Json(admin.map(|admin| AdminProfile {
        id: admin.admin_id,
        email: admin.email,
        name: admin.name,
    }))
}

/// List admin accounts.
///
/// GET /api/admin/admins
///
/// # Errors
///
/// Returns `Unauthorized` without an admin session.
pub async fn list_admins(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
) -> Result<Json<Vec<AdminUser>>, AppError> {
    let admins = AdminAuthService::new(state.pool()).list_admins().await?;
    Ok(Json(admins))
}

/// Create an admin account.
///
/// POST /api/admin/admins
///
/// # Errors
///
/// Returns `BadRequest` for invalid input and `Conflict` for a taken email.
pub async fn create_admin(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Json(form): Json<CreateAdminRequest>,
) -> Result<(StatusCode, Json<AdminUser>), AppError> {
    let admin = AdminAuthService::new(state.pool())
        .create_admin(&form.email, &form.password, form.name.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(admin)))
}

/// Delete another admin account.
///
/// DELETE /api/admin/admins/{id}
///
/// # Errors
///
/// Returns `BadRequest` when deleting yourself and `NotFound` for an
/// unknown admin.
pub async fn delete_admin(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    Path(id): Path<AdminUserId>,
) -> Result<StatusCode, AppError> {
    AdminAuthService::new(state.pool())
        .delete_admin(admin.admin_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

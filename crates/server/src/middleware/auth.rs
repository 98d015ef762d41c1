//! Authentication extractors.
//!
//! Each extractor reads the session cookie for its tier and resolves it
//! through the [`RoleGate`](crate::services::RoleGate). Rejections are
//! [`AppError`]s, so they render as the usual JSON error body.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn list_products(
//!     State(state): State<AppState>,
//!     StoreOwnerSession(owner): StoreOwnerSession,
//! ) -> Result<Json<Vec<Product>>, AppError> {
//!     Ok(Json(ProductService::new(state.pool()).list(&owner).await?))
//! }
//! ```

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::Span;

use super::cookies::{ADMIN_SESSION_COOKIE, STORE_SESSION_COOKIE, read_cookie};
use crate::error::{AppError, set_sentry_user};
use crate::models::PlatformUser;
use crate::services::{PlatformAdmin, SessionValidator, StoreOwner};
use crate::state::AppState;

/// Raw session tokens carried by the request, if any.
#[derive(Debug, Clone, Default)]
pub struct SessionCookies {
    pub admin: Option<String>,
    pub store: Option<String>,
}

impl<S> FromRequestParts<S> for SessionCookies
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            admin: read_cookie(&parts.headers, ADMIN_SESSION_COOKIE),
            store: read_cookie(&parts.headers, STORE_SESSION_COOKIE),
        })
    }
}

/// Extractor that requires a platform admin on the allowlist.
pub struct AdminSession(pub PlatformAdmin);

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = read_cookie(&parts.headers, ADMIN_SESSION_COOKIE);
        let admin = state.gate().require_admin(token.as_deref()).await?;
        record_admin(&admin);
        Ok(Self(admin))
    }
}

/// Extractor that requires a store owner session.
///
/// Handlers still check the target store with
/// [`StoreOwner::ensure_store`] before touching store data.
pub struct StoreOwnerSession(pub StoreOwner);

impl FromRequestParts<AppState> for StoreOwnerSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = read_cookie(&parts.headers, STORE_SESSION_COOKIE);
        let owner = state
            .gate()
            .authenticate_store_owner(token.as_deref())
            .await?;
        record_store_owner(&owner);
        Ok(Self(owner))
    }
}

/// Extractor for the platform-panel user mirrored from an admin session.
pub struct LegacyUser(pub PlatformUser);

impl FromRequestParts<AppState> for LegacyUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = read_cookie(&parts.headers, ADMIN_SESSION_COOKIE);
        let user = state.gate().require_legacy_user(token.as_deref()).await?;

        set_sentry_user(&user.open_id, user.email.as_deref());
        Span::current().record("principal", format!("user:{}", user.id).as_str());
        Ok(Self(user))
    }
}

/// Extractor that optionally resolves an admin session. Never rejects.
pub struct OptionalAdminSession(pub Option<PlatformAdmin>);

impl FromRequestParts<AppState> for OptionalAdminSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = read_cookie(&parts.headers, ADMIN_SESSION_COOKIE);
        let admin = SessionValidator::new(state.pool())
            .platform_admin(token.as_deref())
            .await;
        if let Some(admin) = &admin {
            record_admin(admin);
        }
        Ok(Self(admin))
    }
}

/// Extractor that optionally resolves a store owner session. Never rejects.
pub struct OptionalStoreSession(pub Option<StoreOwner>);

impl FromRequestParts<AppState> for OptionalStoreSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = read_cookie(&parts.headers, STORE_SESSION_COOKIE);
        let owner = SessionValidator::new(state.pool())
            .store_owner(token.as_deref())
            .await;
        if let Some(owner) = &owner {
            record_store_owner(owner);
        }
        Ok(Self(owner))
    }
}

fn record_admin(admin: &PlatformAdmin) {
    set_sentry_user(&format!("admin-{}", admin.admin_id), Some(admin.email.as_str()));
    Span::current().record("principal", format!("admin:{}", admin.admin_id).as_str());
}

fn record_store_owner(owner: &StoreOwner) {
    set_sentry_user(&format!("store-{}", owner.store_id), Some(owner.email.as_str()));
    Span::current().record("principal", format!("store:{}", owner.store_id).as_str());
}

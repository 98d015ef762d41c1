//! Session validation: turn a bearer token into a principal.
//!
//! Validation is read-only. A missing token, an unknown token and a storage
//! failure all resolve to the anonymous buyer; storage failures are logged
//! so they do not go unnoticed.

use sqlx::SqlitePool;

use vitrine_core::{AdminUserId, Email, StoreCredentialId, StoreId};

use crate::db::{AdminUserRepository, StoreCredentialRepository};

/// Which credential tier a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Admin,
    StoreOwner,
}

/// An authenticated store owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOwner {
    pub credential_id: StoreCredentialId,
    pub store_id: StoreId,
    pub email: Email,
}

/// An authenticated platform administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformAdmin {
    pub admin_id: AdminUserId,
    pub email: Email,
    pub name: Option<String>,
}

/// The resolved identity behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    AnonymousBuyer,
    StoreOwner(StoreOwner),
    PlatformAdmin(PlatformAdmin),
}

/// Resolves session tokens against the credential store.
pub struct SessionValidator<'a> {
    admins: AdminUserRepository<'a>,
    credentials: StoreCredentialRepository<'a>,
}

impl<'a> SessionValidator<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            admins: AdminUserRepository::new(pool),
            credentials: StoreCredentialRepository::new(pool),
        }
    }

    /// Resolve `token` as a session of the given kind.
    pub async fn resolve(&self, token: Option<&str>, kind: SessionKind) -> Principal {
        let resolved = match kind {
            SessionKind::Admin => self.platform_admin(token).await.map(Principal::PlatformAdmin),
            SessionKind::StoreOwner => self.store_owner(token).await.map(Principal::StoreOwner),
        };
        resolved.unwrap_or(Principal::AnonymousBuyer)
    }

    /// Resolve a store owner session.
    pub async fn store_owner(&self, token: Option<&str>) -> Option<StoreOwner> {
        let token = token.filter(|t| !t.is_empty())?;

        match self.credentials.get_by_session_token(token).await {
            Ok(credential) => credential.map(|c| StoreOwner {
                credential_id: c.id,
                store_id: c.store_id,
                email: c.email,
            }),
            Err(e) => {
                tracing::error!(error = %e, "Failed to resolve store session");
                None
            }
        }
    }

    /// Resolve a platform admin session.
    pub async fn platform_admin(&self, token: Option<&str>) -> Option<PlatformAdmin> {
        let token = token.filter(|t| !t.is_empty())?;

        match self.admins.get_by_session_token(token).await {
            Ok(admin) => admin.map(|a| PlatformAdmin {
                admin_id: a.id,
                email: a.email,
                name: a.name,
            }),
            Err(e) => {
                tracing::error!(error = %e, "Failed to resolve admin session");
                None
            }
        }
    }
}

//! Role gate: the authorization checks every protected operation runs.
//!
//! There are two ownership paths and they are kept apart:
//!
//! - **Store credential path.** A store owner's session carries its own
//!   `store_id`. Every store-scoped entity operation (products, orders,
//!   coupons, tracking links, affiliates, sales) goes through
//!   [`RoleGate::require_store_owner`] or [`StoreOwner::ensure_store`].
//! - **Legacy platform-user path.** An admin session is mirrored into a
//!   `platform_user` row and a store is owned when `store.user_id` matches
//!   it. Only the platform-panel store records use
//!   [`RoleGate::require_owner_of_legacy_user`].

use sqlx::SqlitePool;

use vitrine_core::StoreId;

use crate::config::AdminAllowlist;
use crate::db::{PlatformUserRepository, StoreRepository};
use crate::error::AppError;
use crate::models::{PlatformRole, PlatformUser, Store};
use crate::services::sessions::{PlatformAdmin, SessionValidator, StoreOwner};

impl StoreOwner {
    /// Check that this owner's session belongs to `store_id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` if the stores differ.
    pub fn ensure_store(&self, store_id: StoreId) -> Result<(), AppError> {
        if self.store_id == store_id {
            Ok(())
        } else {
            tracing::warn!(
                session_store_id = %self.store_id,
                target_store_id = %store_id,
                "Store owner denied access to another store"
            );
            Err(AppError::Forbidden("access denied".to_string()))
        }
    }
}

/// Authorization checks backed by the session validator.
pub struct RoleGate<'a> {
    sessions: SessionValidator<'a>,
    stores: StoreRepository<'a>,
    users: PlatformUserRepository<'a>,
    allowlist: &'a AdminAllowlist,
}

impl<'a> RoleGate<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool, allowlist: &'a AdminAllowlist) -> Self {
        Self {
            sessions: SessionValidator::new(pool),
            stores: StoreRepository::new(pool),
            users: PlatformUserRepository::new(pool),
            allowlist,
        }
    }

    /// Require any valid store owner session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` if there is no valid store session.
    pub async fn authenticate_store_owner(
        &self,
        token: Option<&str>,
    ) -> Result<StoreOwner, AppError> {
        self.sessions
            .store_owner(token)
            .await
            .ok_or_else(|| AppError::Unauthorized("store login required".to_string()))
    }

    /// Require a store owner session for exactly `store_id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` without a session and
    /// `AppError::Forbidden` when the session belongs to another store.
    pub async fn require_store_owner(
        &self,
        token: Option<&str>,
        store_id: StoreId,
    ) -> Result<StoreOwner, AppError> {
        let owner = self.authenticate_store_owner(token).await?;
        owner.ensure_store(store_id)?;
        Ok(owner)
    }

    /// Require any valid admin session, ignoring the allowlist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` if there is no valid admin session.
    pub async fn authenticate_admin(&self, token: Option<&str>) -> Result<PlatformAdmin, AppError> {
        self.sessions
            .platform_admin(token)
            .await
            .ok_or_else(|| AppError::Unauthorized("admin login required".to_string()))
    }

    /// Require an admin session whose email passes the configured allowlist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` without a session and
    /// `AppError::Forbidden` if the admin is not on the allowlist.
    pub async fn require_admin(&self, token: Option<&str>) -> Result<PlatformAdmin, AppError> {
        let admin = self.authenticate_admin(token).await?;
        if !self.allowlist.permits(&admin.email) {
            tracing::warn!(admin_id = %admin.admin_id, "Admin not on the platform allowlist");
            return Err(AppError::Forbidden(
                "platform administrator access required".to_string(),
            ));
        }
        Ok(admin)
    }

    /// Resolve the legacy platform user behind an admin session.
    ///
    /// The admin is upserted under the open id `admin-{id}` with the admin
    /// role, refreshing name, email and last sign-in.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` if there is no valid admin session.
    pub async fn require_legacy_user(&self, token: Option<&str>) -> Result<PlatformUser, AppError> {
        let admin = self.authenticate_admin(token).await?;
        let open_id = PlatformUser::open_id_for_admin(admin.admin_id);

        let user = self
            .users
            .upsert(
                &open_id,
                admin.name.as_deref(),
                Some(admin.email.as_str()),
                PlatformRole::Admin,
            )
            .await?;
        Ok(user)
    }

    /// Require that the legacy platform user owns `store_id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` without a session,
    /// `AppError::NotFound` if the store does not exist and
    /// `AppError::Forbidden` if it belongs to another user.
    pub async fn require_owner_of_legacy_user(
        &self,
        token: Option<&str>,
        store_id: StoreId,
    ) -> Result<(PlatformUser, Store), AppError> {
        let user = self.require_legacy_user(token).await?;

        let store = self
            .stores
            .get_by_id(store_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("store {store_id} not found")))?;

        if store.user_id != Some(user.id) {
            return Err(AppError::Forbidden("access denied".to_string()));
        }
        Ok((user, store))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use vitrine_core::{Email, StoreCredentialId};

    use super::*;

    #[test]
    fn test_ensure_store() {
        let owner = StoreOwner {
            credential_id: StoreCredentialId::new(1),
            store_id: StoreId::new(7),
            email: Email::parse("dona@example.com").unwrap(),
        };

        assert!(owner.ensure_store(StoreId::new(7)).is_ok());
        assert!(matches!(
            owner.ensure_store(StoreId::new(8)),
            Err(AppError::Forbidden(_))
        ));
    }
}

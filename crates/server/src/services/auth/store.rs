//! Store owner authentication.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::instrument;

use vitrine_core::{Email, Plan, StoreId, StoreStatus};

use super::{AuthError, generate_session_token, hash_password, validate_password, verify_password};
use crate::db::{StoreCredentialRepository, StoreRepository};
use crate::error::AppError;
use crate::services::sessions::StoreOwner;

/// Result of a successful store owner login.
#[derive(Debug, Clone)]
pub struct StoreLogin {
    pub store_id: StoreId,
    pub token: String,
}

/// What a logged-in store owner sees about their own account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreOwnerProfile {
    pub store_id: StoreId,
    pub store_name: String,
    pub store_slug: String,
    pub email: Email,
    pub plan: Plan,
    pub logo_url: Option<String>,
    pub status: StoreStatus,
}

/// Store owner authentication service.
pub struct StoreAuthService<'a> {
    credentials: StoreCredentialRepository<'a>,
    stores: StoreRepository<'a>,
}

impl<'a> StoreAuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            credentials: StoreCredentialRepository::new(pool),
            stores: StoreRepository::new(pool),
        }
    }

    /// Log a store owner in by email and password.
    ///
    /// One merchant may own several stores under the same email; the
    /// password is checked against each credential, oldest first, and the
    /// first match wins.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if nothing matches and
    /// `AppError::Forbidden` if the matched store is not approved (or the
    /// email only belongs to a store still awaiting approval).
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<StoreLogin, AppError> {
        let email = Email::parse(email).map_err(AuthError::from)?;

        let candidates = self.credentials.list_by_email(&email).await?;
        if candidates.is_empty() {
            if self.stores.has_pending_for_email(&email).await? {
                return Err(awaiting_approval());
            }
            return Err(AuthError::InvalidCredentials.into());
        }

        let credential = candidates
            .into_iter()
            .find(|(_, hash)| verify_password(password, hash).is_ok())
            .map(|(credential, _)| credential)
            .ok_or(AuthError::InvalidCredentials)?;

        let store = self
            .stores
            .get_by_id(credential.store_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        match store.status {
            StoreStatus::Approved => {}
            StoreStatus::Pending => return Err(awaiting_approval()),
            StoreStatus::Rejected => {
                let reason = store.rejection_reason.as_deref().unwrap_or("not informed");
                return Err(AppError::Forbidden(format!(
                    "store was rejected. Reason: {reason}"
                )));
            }
        }

        let token = generate_session_token();
        self.credentials
            .set_session_token(credential.id, &token)
            .await?;

        tracing::info!(store_id = %store.id, "Store owner logged in");
        Ok(StoreLogin {
            store_id: store.id,
            token,
        })
    }

    /// Invalidate a session token. The credential is kept.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the update fails.
    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        self.credentials.clear_session_token(token).await?;
        Ok(())
    }

    /// Profile of the logged-in owner's store.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the store vanished.
    pub async fn profile(&self, owner: &StoreOwner) -> Result<StoreOwnerProfile, AppError> {
        let store = self
            .stores
            .get_by_id(owner.store_id)
            .await?
            .ok_or_else(|| AppError::NotFound("store not found".to_string()))?;

        Ok(StoreOwnerProfile {
            store_id: store.id,
            store_name: store.name,
            store_slug: store.slug,
            email: owner.email.clone(),
            plan: store.plan,
            logo_url: store.logo_url,
            status: store.status,
        })
    }

    /// Change the owner's password after checking the current one.
    ///
    /// The escrowed plain password no longer matches the credential after
    /// this, so it is cleared.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the current password is wrong and
    /// `AuthError::WeakPassword` if the new one is too short.
    #[instrument(skip(self, owner, current_password, new_password), fields(store_id = %owner.store_id))]
    pub async fn update_password(
        &self,
        owner: &StoreOwner,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let (credential, password_hash) = self
            .credentials
            .get_by_store(owner.store_id)
            .await?
            .ok_or_else(|| AppError::NotFound("store credentials not found".to_string()))?;

        verify_password(current_password, &password_hash)
            .map_err(|_| AppError::BadRequest("current password is incorrect".to_string()))?;
        validate_password(new_password)?;

        let new_hash = hash_password(new_password)?;
        self.credentials
            .update_password_hash(credential.id, &new_hash)
            .await?;
        self.stores.clear_plain_password(owner.store_id).await?;

        tracing::info!("Store owner password updated");
        Ok(())
    }
}

fn awaiting_approval() -> AppError {
    AppError::Forbidden("store is awaiting approval".to_string())
}

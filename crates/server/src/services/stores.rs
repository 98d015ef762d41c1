//! Store lifecycle: public registration, admin review, and the store
//! records managed from the platform panel.
//!
//! A store moves `pending -> approved`, `pending -> rejected`,
//! `rejected -> approved` and `rejected -> deleted`. Approval is the only
//! place an owner credential is created.

use std::sync::LazyLock;

use chrono::{Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::instrument;

use vitrine_core::{Email, Plan, StoreId, StoreStatus};

use super::auth::{AuthError, hash_password, validate_password};
use super::codes::{generate_access_code, slug_candidate, slugify};
use super::{optional, required};
use crate::db::{NewStore, RepositoryError, StoreProfileUpdate, StoreRepository};
use crate::error::AppError;
use crate::models::{PlatformUser, Store};

/// Slug used when a store name has no usable characters.
const FALLBACK_SLUG: &str = "loja";

/// Slug candidates tried before giving up on a registration.
const MAX_SLUG_ATTEMPTS: u32 = 100;

/// Free trial granted to stores created from the platform panel.
const TRIAL_DAYS: i64 = 7;

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("Invalid regex"));

/// Public self-registration form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRegistration {
    pub name: String,
    pub owner_email: String,
    pub owner_name: String,
    pub owner_whatsapp: String,
    pub whatsapp: String,
    #[serde(default)]
    pub plan: Plan,
}

/// Result of a public registration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredStore {
    pub id: StoreId,
    pub slug: String,
    pub status: StoreStatus,
}

/// A store created from the platform panel.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyStoreInput {
    pub name: String,
    pub slug: String,
    pub owner_email: String,
    pub owner_name: String,
    pub owner_whatsapp: String,
    pub whatsapp: String,
    #[serde(default)]
    pub plan: Plan,
    pub cpf_cnpj: Option<String>,
    pub category: Option<String>,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
}

/// Result of creating a store from the platform panel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedStore {
    pub id: StoreId,
    pub access_code: String,
}

/// Editable store profile fields. Status is not editable here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub whatsapp: Option<String>,
}

/// Store lifecycle service.
pub struct StoreService<'a> {
    stores: StoreRepository<'a>,
}

impl<'a> StoreService<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            stores: StoreRepository::new(pool),
        }
    }

    /// Register a store from the public form.
    ///
    /// The store starts `pending` with no owner credential. The slug is
    /// derived from the name and suffixed `-2`, `-3`, ... until it is free.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for missing fields or an invalid email.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn register(&self, input: StoreRegistration) -> Result<RegisteredStore, AppError> {
        let name = required("name", &input.name)?;
        let owner_email = Email::parse(&input.owner_email).map_err(AuthError::from)?;

        let mut base = slugify(&name);
        if base.is_empty() {
            FALLBACK_SLUG.clone_into(&mut base);
        }

        let mut new_store = NewStore {
            user_id: None,
            name,
            slug: String::new(),
            owner_email,
            owner_name: required("ownerName", &input.owner_name)?,
            owner_whatsapp: required("ownerWhatsapp", &input.owner_whatsapp)?,
            cpf_cnpj: None,
            category: None,
            plan: input.plan,
            logo_url: None,
            primary_color: None,
            secondary_color: None,
            whatsapp: required("whatsapp", &input.whatsapp)?,
            trial_ends_at: None,
            access_code: generate_access_code(),
        };

        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            let slug = slug_candidate(&base, attempt);
            if self.stores.slug_exists(&slug).await? {
                continue;
            }

            new_store.slug = slug;
            match self.stores.create(&new_store).await {
                Ok(store) => {
                    tracing::info!(store_id = %store.id, slug = %store.slug, "Store registered");
                    return Ok(RegisteredStore {
                        id: store.id,
                        slug: store.slug,
                        status: store.status,
                    });
                }
                // Lost a race for the slug, or drew a taken access code.
                Err(RepositoryError::Conflict(_)) => {
                    new_store.access_code = generate_access_code();
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::Conflict(format!(
            "could not find a free slug for {base}"
        )))
    }

    /// Create a store owned by a platform-panel user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for invalid input and
    /// `AppError::Conflict` if the slug is taken.
    #[instrument(skip(self, user, input), fields(user_id = %user.id, slug = %input.slug))]
    pub async fn create_for_user(
        &self,
        user: &PlatformUser,
        input: LegacyStoreInput,
    ) -> Result<CreatedStore, AppError> {
        let slug = slugify(&input.slug);
        if slug.is_empty() {
            return Err(AppError::BadRequest("slug is required".to_string()));
        }
        let primary_color = validate_color("primaryColor", optional(input.primary_color))?;
        let secondary_color = validate_color("secondaryColor", optional(input.secondary_color))?;

        let new_store = NewStore {
            user_id: Some(user.id),
            name: required("name", &input.name)?,
            slug,
            owner_email: Email::parse(&input.owner_email).map_err(AuthError::from)?,
            owner_name: required("ownerName", &input.owner_name)?,
            owner_whatsapp: required("ownerWhatsapp", &input.owner_whatsapp)?,
            cpf_cnpj: optional(input.cpf_cnpj),
            category: optional(input.category),
            plan: input.plan,
            logo_url: optional(input.logo_url),
            primary_color,
            secondary_color,
            whatsapp: required("whatsapp", &input.whatsapp)?,
            trial_ends_at: Some(Utc::now() + Duration::days(TRIAL_DAYS)),
            access_code: generate_access_code(),
        };

        let store = self.stores.create(&new_store).await?;
        tracing::info!(store_id = %store.id, "Store created from platform panel");

        Ok(CreatedStore {
            id: store.id,
            access_code: store.access_code,
        })
    }

    /// Stores owned by a platform-panel user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list_for_user(&self, user: &PlatformUser) -> Result<Vec<Store>, AppError> {
        Ok(self.stores.list_by_user(user.id).await?)
    }

    /// Every store, for the admin review queue.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Store>, AppError> {
        Ok(self.stores.list_all().await?)
    }

    /// Load a store by id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the store does not exist.
    pub async fn get(&self, id: StoreId) -> Result<Store, AppError> {
        self.stores
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("store {id} not found")))
    }

    /// Load an approved store by slug for the public storefront.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` unless an approved store has this slug.
    pub async fn get_public_by_slug(&self, slug: &str) -> Result<Store, AppError> {
        self.stores
            .get_by_slug(slug)
            .await?
            .filter(|store| store.status == StoreStatus::Approved)
            .ok_or_else(|| AppError::NotFound(format!("store {slug} not found")))
    }

    /// Load a store that can take public traffic (orders, catalog).
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` unless the store exists and is approved.
    pub async fn get_approved(&self, id: StoreId) -> Result<Store, AppError> {
        self.stores
            .get_by_id(id)
            .await?
            .filter(|store| store.status == StoreStatus::Approved)
            .ok_or_else(|| AppError::NotFound(format!("store {id} not found")))
    }

    /// Apply a partial profile update.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a blank name or a colour that is
    /// not `#RRGGBB`, and `AppError::NotFound` if the store does not exist.
    pub async fn update_profile(&self, id: StoreId, update: StoreUpdate) -> Result<Store, AppError> {
        let name = match update.name {
            Some(name) => Some(required("name", &name)?),
            None => None,
        };
        let whatsapp = match update.whatsapp {
            Some(whatsapp) => Some(required("whatsapp", &whatsapp)?),
            None => None,
        };

        let profile = StoreProfileUpdate {
            name,
            category: optional(update.category),
            logo_url: optional(update.logo_url),
            primary_color: validate_color("primaryColor", optional(update.primary_color))?,
            secondary_color: validate_color("secondaryColor", optional(update.secondary_color))?,
            whatsapp,
        };

        Ok(self.stores.update_profile(id, &profile).await?)
    }

    /// Approve a store and provision its owner credential.
    ///
    /// The password is hashed for the credential and escrowed in plain text
    /// on the store for operator recovery. Both are written in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` for a short password,
    /// `AppError::NotFound` if the store does not exist and
    /// `AppError::Conflict` if it already has a credential or is approved.
    #[instrument(skip(self, password))]
    pub async fn approve(&self, id: StoreId, password: &str) -> Result<Store, AppError> {
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let store = self
            .stores
            .approve(id, &password_hash, password)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AppError::NotFound(format!("store {id} not found")),
                other => other.into(),
            })?;

        tracing::info!(store_id = %store.id, "Store approved");
        Ok(store)
    }

    /// Reject a store with a reason. Allowed from any status.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a blank reason and
    /// `AppError::NotFound` if the store does not exist.
    #[instrument(skip(self, reason))]
    pub async fn reject(&self, id: StoreId, reason: &str) -> Result<Store, AppError> {
        let reason = required("reason", reason)?;

        let store = self.stores.reject(id, &reason).await.map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("store {id} not found")),
            other => other.into(),
        })?;

        tracing::info!(store_id = %store.id, "Store rejected");
        Ok(store)
    }

    /// Delete a rejected store and everything it owns.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the store does not exist and
    /// `AppError::Forbidden` unless it is rejected.
    #[instrument(skip(self))]
    pub async fn delete_rejected(&self, id: StoreId) -> Result<(), AppError> {
        self.stores
            .delete_rejected_cascade(id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AppError::NotFound(format!("store {id} not found")),
                RepositoryError::Conflict(_) => {
                    AppError::Forbidden("only rejected stores can be deleted".to_string())
                }
                other => other.into(),
            })?;
        tracing::info!(store_id = %id, "Rejected store deleted");
        Ok(())
    }

    /// Delete a platform-panel store and everything it owns.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the store does not exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: StoreId) -> Result<(), AppError> {
        self.stores.delete_cascade(id).await?;
        tracing::info!(store_id = %id, "Store deleted");
        Ok(())
    }
}

fn validate_color(field: &str, color: Option<String>) -> Result<Option<String>, AppError> {
    match color {
        Some(color) if !HEX_COLOR.is_match(&color) => Err(AppError::BadRequest(format!(
            "{field} must be a #RRGGBB colour"
        ))),
        other => Ok(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_color() {
        assert_eq!(
            validate_color("primaryColor", Some("#0f766E".to_string())).unwrap(),
            Some("#0f766E".to_string())
        );
        assert!(validate_color("primaryColor", None).unwrap().is_none());
        assert!(validate_color("primaryColor", Some("0F766E".to_string())).is_err());
        assert!(validate_color("primaryColor", Some("#0F766".to_string())).is_err());
        assert!(validate_color("primaryColor", Some("red".to_string())).is_err());
    }
}

//! Tenants and their owner credentials.
//!
//! [`Store`] holds the escrowed `plain_password` and is therefore never
//! serialized directly. Routes pick one of the views below depending on who
//! is asking.

use chrono::{DateTime, Utc};
use serde::Serialize;

use vitrine_core::{Email, Plan, PlatformUserId, StoreCredentialId, StoreId, StoreStatus};

/// A tenant store.
#[derive(Debug, Clone)]
pub struct Store {
    pub id: StoreId,
    /// Owning legacy platform user; `None` for public registrations.
    pub user_id: Option<PlatformUserId>,
    pub name: String,
    pub slug: String,
    pub owner_email: Email,
    pub owner_name: String,
    pub owner_whatsapp: String,
    pub cpf_cnpj: Option<String>,
    pub category: Option<String>,
    pub plan: Plan,
    pub logo_url: Option<String>,
    pub primary_color: String,
    pub secondary_color: String,
    pub whatsapp: String,
    pub status: StoreStatus,
    pub rejection_reason: Option<String>,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub access_code: String,
    /// Password set at approval time, kept for admin-side recovery.
    pub plain_password: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Login credential of a store owner. At most one per store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreCredential {
    pub id: StoreCredentialId,
    pub store_id: StoreId,
    pub email: Email,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Storefront-facing view of an approved store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicStore {
    pub id: StoreId,
    pub name: String,
    pub slug: String,
    pub category: Option<String>,
    pub plan: Plan,
    pub logo_url: Option<String>,
    pub primary_color: String,
    pub secondary_color: String,
    pub whatsapp: String,
}

impl From<&Store> for PublicStore {
    fn from(store: &Store) -> Self {
        Self {
            id: store.id,
            name: store.name.clone(),
            slug: store.slug.clone(),
            category: store.category.clone(),
            plan: store.plan,
            logo_url: store.logo_url.clone(),
            primary_color: store.primary_color.clone(),
            secondary_color: store.secondary_color.clone(),
            whatsapp: store.whatsapp.clone(),
        }
    }
}

/// View for the owning platform user. Everything except the escrowed password.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerStore {
    pub id: StoreId,
    pub name: String,
    pub slug: String,
    pub owner_email: Email,
    pub owner_name: String,
    pub owner_whatsapp: String,
    pub cpf_cnpj: Option<String>,
    pub category: Option<String>,
    pub plan: Plan,
    pub logo_url: Option<String>,
    pub primary_color: String,
    pub secondary_color: String,
    pub whatsapp: String,
    pub status: StoreStatus,
    pub rejection_reason: Option<String>,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub access_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Store> for OwnerStore {
    fn from(store: &Store) -> Self {
        Self {
            id: store.id,
            name: store.name.clone(),
            slug: store.slug.clone(),
            owner_email: store.owner_email.clone(),
            owner_name: store.owner_name.clone(),
            owner_whatsapp: store.owner_whatsapp.clone(),
            cpf_cnpj: store.cpf_cnpj.clone(),
            category: store.category.clone(),
            plan: store.plan,
            logo_url: store.logo_url.clone(),
            primary_color: store.primary_color.clone(),
            secondary_color: store.secondary_color.clone(),
            whatsapp: store.whatsapp.clone(),
            status: store.status,
            rejection_reason: store.rejection_reason.clone(),
            trial_ends_at: store.trial_ends_at,
            access_code: store.access_code.clone(),
            created_at: store.created_at,
            updated_at: store.updated_at,
        }
    }
}

/// Platform admin view, including the escrowed password.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStore {
    #[serde(flatten)]
    pub store: OwnerStore,
    pub user_id: Option<PlatformUserId>,
    pub plain_password: Option<String>,
}

impl From<&Store> for AdminStore {
    fn from(store: &Store) -> Self {
        Self {
            store: OwnerStore::from(store),
            user_id: store.user_id,
            plain_password: store.plain_password.clone(),
        }
    }
}

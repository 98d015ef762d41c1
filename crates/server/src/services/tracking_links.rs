//! Campaign tracking links.

use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::instrument;
use url::Url;

use vitrine_core::{ActivationStatus, Feature, ProductId, StoreId, TrackingLinkId};

use super::codes::slugify;
use super::sessions::StoreOwner;
use super::{ensure_feature, required};
use crate::db::{NewTrackingLink, ProductRepository, StoreRepository, TrackingLinkRepository};
use crate::error::AppError;
use crate::models::TrackingLink;

/// New tracking link form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingLinkInput {
    pub name: String,
    pub slug: String,
    pub target_url: String,
    pub product_id: Option<ProductId>,
}

/// Partial tracking link update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingLinkUpdate {
    pub name: Option<String>,
    pub target_url: Option<String>,
    pub status: Option<ActivationStatus>,
}

/// Tracking link service.
pub struct TrackingLinkService<'a> {
    links: TrackingLinkRepository<'a>,
    products: ProductRepository<'a>,
    stores: StoreRepository<'a>,
}

impl<'a> TrackingLinkService<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            links: TrackingLinkRepository::new(pool),
            products: ProductRepository::new(pool),
            stores: StoreRepository::new(pool),
        }
    }

    /// Create a link for the owner's store.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` if the plan has no tracking links or
    /// the product belongs to another store, `AppError::BadRequest` for
    /// invalid input and `AppError::Conflict` for a duplicate slug.
    #[instrument(skip(self, owner, input), fields(store_id = %owner.store_id))]
    pub async fn create(
        &self,
        owner: &StoreOwner,
        input: TrackingLinkInput,
    ) -> Result<TrackingLink, AppError> {
        self.ensure_links(owner).await?;

        let slug = slugify(&input.slug);
        if slug.is_empty() {
            return Err(AppError::BadRequest("slug is required".to_string()));
        }

        if let Some(product_id) = input.product_id {
            let product = self
                .products
                .get_by_id(product_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("product {product_id} not found")))?;
            owner.ensure_store(product.store_id)?;
        }

        let link = self
            .links
            .create(&NewTrackingLink {
                store_id: owner.store_id,
                name: required("name", &input.name)?,
                slug,
                target_url: validate_target(&input.target_url)?,
                product_id: input.product_id,
            })
            .await?;

        tracing::info!(link_id = %link.id, slug = %link.slug, "Tracking link created");
        Ok(link)
    }

    /// Every link of the owner's store.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list(&self, owner: &StoreOwner) -> Result<Vec<TrackingLink>, AppError> {
        Ok(self.links.list_by_store(owner.store_id).await?)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound`, `AppError::Forbidden` for another store
    /// or a plan without tracking links, and `AppError::BadRequest` for an
    /// invalid URL.
    #[instrument(skip(self, owner, update), fields(store_id = %owner.store_id))]
    pub async fn update(
        &self,
        owner: &StoreOwner,
        id: TrackingLinkId,
        update: TrackingLinkUpdate,
    ) -> Result<TrackingLink, AppError> {
        let mut link = self.owned(owner, id).await?;
        self.ensure_links(owner).await?;

        if let Some(name) = update.name {
            link.name = required("name", &name)?;
        }
        if let Some(target_url) = update.target_url {
            link.target_url = validate_target(&target_url)?;
        }
        if let Some(status) = update.status {
            link.status = status;
        }

        Ok(self.links.update(&link).await?)
    }

    /// Delete one of the owner's links.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` or `AppError::Forbidden` for another store.
    #[instrument(skip(self, owner), fields(store_id = %owner.store_id))]
    pub async fn delete(&self, owner: &StoreOwner, id: TrackingLinkId) -> Result<(), AppError> {
        self.owned(owner, id).await?;
        self.links.delete(id).await?;
        tracing::info!(link_id = %id, "Tracking link deleted");
        Ok(())
    }

    /// Count a visit through an active link and return where it points.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` unless the store has an active link with
    /// this slug.
    pub async fn click(&self, store_id: StoreId, slug: &str) -> Result<String, AppError> {
        self.links
            .record_click(store_id, slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("tracking link {slug} not found")))
    }

    async fn owned(&self, owner: &StoreOwner, id: TrackingLinkId) -> Result<TrackingLink, AppError> {
        let link = self
            .links
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("tracking link {id} not found")))?;
        owner.ensure_store(link.store_id)?;
        Ok(link)
    }

    async fn ensure_links(&self, owner: &StoreOwner) -> Result<(), AppError> {
        let store = self
            .stores
            .get_by_id(owner.store_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("store {} not found", owner.store_id)))?;
        ensure_feature(store.plan, Feature::TrackingLinks)
    }
}

/// Accept only absolute `http`/`https` URLs.
fn validate_target(target: &str) -> Result<String, AppError> {
    let url = Url::parse(target.trim())
        .map_err(|e| AppError::BadRequest(format!("invalid targetUrl: {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        scheme => Err(AppError::BadRequest(format!(
            "targetUrl must use http or https, not {scheme}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_target() {
        assert_eq!(
            validate_target(" https://loja.example.com/promo?utm=ig ").unwrap(),
            "https://loja.example.com/promo?utm=ig"
        );
        assert!(validate_target("http://example.com").is_ok());
        assert!(validate_target("/relative/path").is_err());
        assert!(validate_target("javascript:alert(1)").is_err());
        assert!(validate_target("ftp://example.com/file").is_err());
    }
}

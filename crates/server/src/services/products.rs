//! Product catalog management.

use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::instrument;

use vitrine_core::{ActivationStatus, Cents, Feature, ProductId, StoreId, StoreStatus};

use super::sessions::StoreOwner;
use super::{ensure_feature, nullable, optional, required};
use crate::db::{NewProduct, ProductRepository, StoreRepository};
use crate::error::AppError;
use crate::models::{Product, Store};

/// New product form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price: Cents,
    pub category: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub video_url: Option<String>,
    pub stock: Option<i64>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub available_for_affiliates: bool,
}

/// Partial product update. An empty `videoUrl` removes the video and a
/// `null` stock stops tracking it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Cents>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub video_url: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub stock: Option<Option<i64>>,
    pub status: Option<ActivationStatus>,
    pub featured: Option<bool>,
    pub available_for_affiliates: Option<bool>,
}

/// Product catalog service.
pub struct ProductService<'a> {
    products: ProductRepository<'a>,
    stores: StoreRepository<'a>,
}

impl<'a> ProductService<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            products: ProductRepository::new(pool),
            stores: StoreRepository::new(pool),
        }
    }

    /// Add a product to the owner's store.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` if the plan's product cap is reached or
    /// a gated field is set, and `AppError::BadRequest` for invalid input.
    #[instrument(skip(self, owner, input), fields(store_id = %owner.store_id))]
    pub async fn create(&self, owner: &StoreOwner, input: ProductInput) -> Result<Product, AppError> {
        let store = self.owner_store(owner).await?;
        let max_products = store.plan.max_products();

        let video_url = optional(input.video_url);
        if video_url.is_some() {
            ensure_feature(store.plan, Feature::ProductVideo)?;
        }
        if input.available_for_affiliates {
            ensure_feature(store.plan, Feature::AffiliateProducts)?;
        }
        validate_price(input.price)?;
        validate_stock(input.stock)?;

        let new_product = NewProduct {
            store_id: store.id,
            name: required("name", &input.name)?,
            description: optional(input.description),
            price: input.price,
            category: optional(input.category),
            images: input.images,
            video_url,
            stock: input.stock,
            featured: input.featured,
            available_for_affiliates: input.available_for_affiliates,
        };
        let product = self
            .products
            .create(&new_product, max_products.map(i64::from))
            .await?
            .ok_or_else(|| {
                AppError::Forbidden(format!(
                    "the {} plan allows at most {} products",
                    store.plan,
                    max_products.unwrap_or_default()
                ))
            })?;

        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Every product of the owner's store, in any status.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list(&self, owner: &StoreOwner) -> Result<Vec<Product>, AppError> {
        Ok(self.products.list_by_store(owner.store_id).await?)
    }

    /// Load one of the owner's products.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if it does not exist and
    /// `AppError::Forbidden` if it belongs to another store.
    pub async fn get(&self, owner: &StoreOwner, id: ProductId) -> Result<Product, AppError> {
        let product = self
            .products
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {id} not found")))?;
        owner.ensure_store(product.store_id)?;
        Ok(product)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get`], plus the plan gates of [`Self::create`].
    #[instrument(skip(self, owner, update), fields(store_id = %owner.store_id))]
    pub async fn update(
        &self,
        owner: &StoreOwner,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, AppError> {
        let mut product = self.get(owner, id).await?;
        let store = self.owner_store(owner).await?;

        if let Some(video_url) = update.video_url {
            let video_url = optional(Some(video_url));
            if video_url.is_some() {
                ensure_feature(store.plan, Feature::ProductVideo)?;
            }
            product.video_url = video_url;
        }
        if let Some(available) = update.available_for_affiliates {
            if available {
                ensure_feature(store.plan, Feature::AffiliateProducts)?;
            }
            product.available_for_affiliates = available;
        }

        if let Some(name) = update.name {
            product.name = required("name", &name)?;
        }
        if let Some(price) = update.price {
            validate_price(price)?;
            product.price = price;
        }
        if let Some(stock) = update.stock {
            validate_stock(stock)?;
            product.stock = stock;
        }
        if update.description.is_some() {
            product.description = optional(update.description);
        }
        if update.category.is_some() {
            product.category = optional(update.category);
        }
        if let Some(images) = update.images {
            product.images = images;
        }
        if let Some(status) = update.status {
            product.status = status;
        }
        if let Some(featured) = update.featured {
            product.featured = featured;
        }

        Ok(self.products.update(&product).await?)
    }

    /// Delete one of the owner's products.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get`].
    #[instrument(skip(self, owner), fields(store_id = %owner.store_id))]
    pub async fn delete(&self, owner: &StoreOwner, id: ProductId) -> Result<(), AppError> {
        self.get(owner, id).await?;
        self.products.delete(id).await?;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// Active products of an approved store, for the public catalog.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` unless the store exists and is approved.
    pub async fn list_public(&self, store_id: StoreId) -> Result<Vec<Product>, AppError> {
        let approved = self
            .stores
            .get_by_id(store_id)
            .await?
            .is_some_and(|store| store.status == StoreStatus::Approved);
        if !approved {
            return Err(AppError::NotFound(format!("store {store_id} not found")));
        }

        Ok(self.products.list_active_by_store(store_id).await?)
    }

    async fn owner_store(&self, owner: &StoreOwner) -> Result<Store, AppError> {
        self.stores
            .get_by_id(owner.store_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("store {} not found", owner.store_id)))
    }
}

fn validate_price(price: Cents) -> Result<(), AppError> {
    if price < 0 {
        return Err(AppError::BadRequest("price must not be negative".to_string()));
    }
    Ok(())
}

fn validate_stock(stock: Option<i64>) -> Result<(), AppError> {
    if stock.is_some_and(|s| s < 0) {
        return Err(AppError::BadRequest("stock must not be negative".to_string()));
    }
    Ok(())
}

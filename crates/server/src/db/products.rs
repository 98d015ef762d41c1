//! Product repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::types::Json;

use vitrine_core::{ActivationStatus, Cents, ProductId, StoreId};

use super::RepositoryError;
use crate::models::Product;

const PRODUCT_COLUMNS: &str = "id, store_id, name, description, price, category, images, video_url, \
     stock, status, featured, available_for_affiliates, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    store_id: i64,
    name: String,
    description: Option<String>,
    price: i64,
    category: Option<String>,
    images: Json<Vec<String>>,
    video_url: Option<String>,
    stock: Option<i64>,
    status: ActivationStatus,
    featured: bool,
    available_for_affiliates: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            store_id: StoreId::new(row.store_id),
            name: row.name,
            description: row.description,
            price: row.price,
            category: row.category,
            images: row.images.0,
            video_url: row.video_url,
            stock: row.stock,
            status: row.status,
            featured: row.featured,
            available_for_affiliates: row.available_for_affiliates,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Fields for a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub store_id: StoreId,
    pub name: String,
    pub description: Option<String>,
    pub price: Cents,
    pub category: Option<String>,
    pub images: Vec<String>,
    pub video_url: Option<String>,
    pub stock: Option<i64>,
    pub featured: bool,
    pub available_for_affiliates: bool,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new active product unless the store already holds
    /// `max_products` of them.
    ///
    /// The count is a subquery of the insert itself, so concurrent creates
    /// cannot push a store past its cap. `None` means the cap was reached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        product: &NewProduct,
        max_products: Option<i64>,
    ) -> Result<Option<Product>, RepositoryError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO product (store_id, name, description, price, category, images, \
                 video_url, stock, status, featured, available_for_affiliates, created_at, updated_at) \
             SELECT $1, $2, $3, $4, $5, $6, $7, $8, 'active', $9, $10, $11, $11 \
             WHERE $12 IS NULL \
                OR (SELECT COUNT(*) FROM product WHERE store_id = $1) < $12 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(product.store_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.category)
        .bind(Json(&product.images))
        .bind(&product.video_url)
        .bind(product.stock)
        .bind(product.featured)
        .bind(product.available_for_affiliates)
        .bind(now)
        .bind(max_products)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List a store's products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_store(&self, store_id: StoreId) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE store_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List a store's active products, featured first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active_by_store(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE store_id = $1 AND status = 'active' \
             ORDER BY featured DESC, created_at DESC, id DESC"
        ))
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Persist every editable field of `product`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn update(&self, product: &Product) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE product SET name = $1, description = $2, price = $3, category = $4, \
                 images = $5, video_url = $6, stock = $7, status = $8, featured = $9, \
                 available_for_affiliates = $10, updated_at = $11 \
             WHERE id = $12 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.category)
        .bind(Json(&product.images))
        .bind(&product.video_url)
        .bind(product.stock)
        .bind(product.status)
        .bind(product.featured)
        .bind(product.available_for_affiliates)
        .bind(Utc::now())
        .bind(product.id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

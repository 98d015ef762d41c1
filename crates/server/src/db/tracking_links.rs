//! Tracking link repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use vitrine_core::{ActivationStatus, ProductId, StoreId, TrackingLinkId};

use super::RepositoryError;
use crate::models::TrackingLink;

const LINK_COLUMNS: &str = "id, store_id, name, slug, target_url, product_id, clicks, conversions, \
     status, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct TrackingLinkRow {
    id: i64,
    store_id: i64,
    name: String,
    slug: String,
    target_url: String,
    product_id: Option<i64>,
    clicks: i64,
    conversions: i64,
    status: ActivationStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TrackingLinkRow> for TrackingLink {
    fn from(row: TrackingLinkRow) -> Self {
        Self {
            id: TrackingLinkId::new(row.id),
            store_id: StoreId::new(row.store_id),
            name: row.name,
            slug: row.slug,
            target_url: row.target_url,
            product_id: row.product_id.map(ProductId::new),
            clicks: row.clicks,
            conversions: row.conversions,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Fields for a new tracking link.
#[derive(Debug, Clone)]
pub struct NewTrackingLink {
    pub store_id: StoreId,
    pub name: String,
    pub slug: String,
    pub target_url: String,
    pub product_id: Option<ProductId>,
}

/// Repository for tracking link database operations.
pub struct TrackingLinkRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TrackingLinkRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new active link.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the store already uses the slug.
    pub async fn create(&self, link: &NewTrackingLink) -> Result<TrackingLink, RepositoryError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, TrackingLinkRow>(&format!(
            "INSERT INTO tracking_link (store_id, name, slug, target_url, product_id, clicks, \
                 conversions, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, 0, 0, 'active', $6, $6) \
             RETURNING {LINK_COLUMNS}"
        ))
        .bind(link.store_id)
        .bind(&link.name)
        .bind(&link.slug)
        .bind(&link.target_url)
        .bind(link.product_id)
        .bind(now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "slug already in use for this store"))?;

        Ok(row.into())
    }

    /// Get a link by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(
        &self,
        id: TrackingLinkId,
    ) -> Result<Option<TrackingLink>, RepositoryError> {
        let row = sqlx::query_as::<_, TrackingLinkRow>(&format!(
            "SELECT {LINK_COLUMNS} FROM tracking_link WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get a link by its slug within a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(
        &self,
        store_id: StoreId,
        slug: &str,
    ) -> Result<Option<TrackingLink>, RepositoryError> {
        let row = sqlx::query_as::<_, TrackingLinkRow>(&format!(
            "SELECT {LINK_COLUMNS} FROM tracking_link WHERE store_id = $1 AND slug = $2"
        ))
        .bind(store_id)
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List a store's links, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_store(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<TrackingLink>, RepositoryError> {
        let rows = sqlx::query_as::<_, TrackingLinkRow>(&format!(
            "SELECT {LINK_COLUMNS} FROM tracking_link WHERE store_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Persist the editable fields of `link`. Counters are untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the link does not exist.
    pub async fn update(&self, link: &TrackingLink) -> Result<TrackingLink, RepositoryError> {
        let row = sqlx::query_as::<_, TrackingLinkRow>(&format!(
            "UPDATE tracking_link SET name = $1, target_url = $2, status = $3, updated_at = $4 \
             WHERE id = $5 \
             RETURNING {LINK_COLUMNS}"
        ))
        .bind(&link.name)
        .bind(&link.target_url)
        .bind(link.status)
        .bind(Utc::now())
        .bind(link.id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Atomically count a click on an active link and return its target.
    ///
    /// Returns `None` if no active link has this slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn record_click(
        &self,
        store_id: StoreId,
        slug: &str,
    ) -> Result<Option<String>, RepositoryError> {
        let target: Option<String> = sqlx::query_scalar(
            "UPDATE tracking_link SET clicks = clicks + 1 \
             WHERE store_id = $1 AND slug = $2 AND status = 'active' \
             RETURNING target_url",
        )
        .bind(store_id)
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(target)
    }

    /// Atomically count a conversion on an active link.
    ///
    /// Returns whether a link was updated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn record_conversion(
        &self,
        store_id: StoreId,
        slug: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE tracking_link SET conversions = conversions + 1 \
             WHERE store_id = $1 AND slug = $2 AND status = 'active'",
        )
        .bind(store_id)
        .bind(slug)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a link.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the link does not exist.
    pub async fn delete(&self, id: TrackingLinkId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM tracking_link WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

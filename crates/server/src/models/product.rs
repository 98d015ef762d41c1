//! Catalog products.

use chrono::{DateTime, Utc};
use serde::Serialize;

use vitrine_core::{ActivationStatus, Cents, ProductId, StoreId};

/// A product listed by a store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub store_id: StoreId,
    pub name: String,
    pub description: Option<String>,
    pub price: Cents,
    pub category: Option<String>,
    pub images: Vec<String>,
    pub video_url: Option<String>,
    /// `None` when stock is not tracked.
    pub stock: Option<i64>,
    pub status: ActivationStatus,
    pub featured: bool,
    pub available_for_affiliates: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

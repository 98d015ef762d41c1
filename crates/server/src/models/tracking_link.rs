//! Campaign tracking links.

use chrono::{DateTime, Utc};
use serde::Serialize;

use vitrine_core::{ActivationStatus, ProductId, StoreId, TrackingLinkId};

/// A short link that counts clicks before redirecting to `target_url`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingLink {
    pub id: TrackingLinkId,
    pub store_id: StoreId,
    pub name: String,
    pub slug: String,
    pub target_url: String,
    pub product_id: Option<ProductId>,
    pub clicks: i64,
    pub conversions: i64,
    pub status: ActivationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

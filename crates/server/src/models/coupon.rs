//! Discount coupons.

use chrono::{DateTime, Utc};
use serde::Serialize;

use vitrine_core::{ActivationStatus, Cents, CouponId, CouponType, StoreId};

/// A store coupon. `code` is stored upper-cased and unique per store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: CouponId,
    pub store_id: StoreId,
    pub code: String,
    #[serde(rename = "type")]
    pub kind: CouponType,
    /// Percentage in `0..=100` or an amount in cents, depending on `kind`.
    pub value: i64,
    pub min_purchase: Cents,
    /// Zero means unlimited.
    pub max_uses: i64,
    pub current_uses: i64,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub status: ActivationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    /// Whether `max_uses` caps redemptions and the cap has been reached.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.max_uses > 0 && self.current_uses >= self.max_uses
    }

    /// Whether `now` falls inside the inclusive validity window.
    #[must_use]
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        self.valid_from <= now && now <= self.valid_until
    }
}

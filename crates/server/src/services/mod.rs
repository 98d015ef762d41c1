//! Business logic services.
//!
//! Services own the rules; repositories own the SQL. Every service borrows
//! the pool for the duration of one request.

pub mod affiliates;
pub mod auth;
pub mod codes;
pub mod coupons;
pub mod gate;
pub mod orders;
pub mod products;
pub mod sessions;
pub mod stores;
pub mod tracking_links;

pub use affiliates::{AffiliateInput, AffiliateService, AffiliateUpdate, CreatedAffiliate};
pub use auth::{AdminAuthService, AuthError, StoreAuthService, StoreLogin, StoreOwnerProfile};
pub use coupons::{CouponInput, CouponService, CouponUpdate, CouponValidation, CouponValidator};
pub use gate::RoleGate;
pub use orders::{CreatedOrder, OrderInput, OrderService};
pub use products::{ProductInput, ProductService, ProductUpdate};
pub use sessions::{PlatformAdmin, Principal, SessionKind, SessionValidator, StoreOwner};
pub use stores::{
    CreatedStore, LegacyStoreInput, RegisteredStore, StoreRegistration, StoreService, StoreUpdate,
};
pub use tracking_links::{TrackingLinkInput, TrackingLinkService, TrackingLinkUpdate};

use serde::{Deserialize, Deserializer};
use vitrine_core::{Feature, Plan};

use crate::error::AppError;

/// Reject the operation unless `plan` unlocks `feature`.
///
/// # Errors
///
/// Returns `AppError::Forbidden` naming the feature.
pub fn ensure_feature(plan: Plan, feature: Feature) -> Result<(), AppError> {
    if plan.is_allowed(feature) {
        Ok(())
    } else {
        tracing::debug!(plan = %plan, feature = feature.label(), "Plan feature denied");
        Err(AppError::Forbidden(format!(
            "{} are not available on the {plan} plan",
            feature.label()
        )))
    }
}

/// Trim a required text field.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the field is blank.
pub(crate) fn required(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field, mapping blank to `None`.
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Deserialize a patch field that tells an explicit `null` from a missing key.
///
/// Pair with `#[serde(default)]`: a missing key stays `None`, `null` becomes
/// `Some(None)` (clear) and a value becomes `Some(Some(v))` (set).
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_feature() {
        assert!(ensure_feature(Plan::Pro, Feature::Coupons).is_ok());

        let err = ensure_feature(Plan::Basic, Feature::TrackingLinks).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref m) if m.contains("tracking links")));
    }

    #[test]
    fn test_text_helpers() {
        assert_eq!(required("name", "  Loja ").ok(), Some("Loja".to_string()));
        assert!(required("name", "   ").is_err());
        assert_eq!(optional(Some("  ".to_string())), None);
        assert_eq!(optional(Some(" x ".to_string())), Some("x".to_string()));
    }
}

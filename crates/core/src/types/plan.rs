//! Subscription plans and the features they unlock.
//!
//! [`Plan::is_allowed`] is the single source of truth for feature gating.
//! Affiliate overage is a billing figure, not a gate, and is computed
//! separately by [`Plan::affiliate_billing`].

use serde::{Deserialize, Serialize};

use super::money::Cents;

/// Product cap for the basic plan.
const BASIC_MAX_PRODUCTS: u32 = 50;

/// Active affiliates included in the platinum subscription.
const INCLUDED_AFFILIATES: u32 = 7;

/// Monthly fee for each active affiliate beyond the included ones (R$ 50.00).
const EXTRA_AFFILIATE_FEE: Cents = 5_000;

/// Store subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlite", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    #[default]
    Basic,
    Pro,
    Platinum,
}

/// A plan-gated capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Coupons,
    TrackingLinks,
    ProductVideo,
    Affiliates,
    /// The `available_for_affiliates` flag on products.
    AffiliateProducts,
}

impl Feature {
    /// Human-readable name used in rejection messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Coupons => "coupons",
            Self::TrackingLinks => "tracking links",
            Self::ProductVideo => "product videos",
            Self::Affiliates => "affiliates",
            Self::AffiliateProducts => "affiliate products",
        }
    }
}

impl Plan {
    /// Returns the stored text representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Pro => "pro",
            Self::Platinum => "platinum",
        }
    }

    /// Whether this plan unlocks `feature`.
    #[must_use]
    pub const fn is_allowed(self, feature: Feature) -> bool {
        match feature {
            Feature::Coupons | Feature::TrackingLinks | Feature::ProductVideo => {
                matches!(self, Self::Pro | Self::Platinum)
            }
            Feature::Affiliates | Feature::AffiliateProducts => matches!(self, Self::Platinum),
        }
    }

    /// Maximum number of products a store may hold, `None` meaning unlimited.
    #[must_use]
    pub const fn max_products(self) -> Option<u32> {
        match self {
            Self::Basic => Some(BASIC_MAX_PRODUCTS),
            Self::Pro | Self::Platinum => None,
        }
    }

    /// Billing exposure for a store with `active_affiliates` active affiliates.
    ///
    /// Exceeding the included count never blocks anything; it only produces
    /// an extra fee for reporting.
    #[must_use]
    pub fn affiliate_billing(self, active_affiliates: u32) -> AffiliateBilling {
        if !self.is_allowed(Feature::Affiliates) {
            return AffiliateBilling {
                active: active_affiliates,
                included: 0,
                extra: 0,
                extra_fee: 0,
            };
        }

        let extra = active_affiliates.saturating_sub(INCLUDED_AFFILIATES);
        AffiliateBilling {
            active: active_affiliates,
            included: INCLUDED_AFFILIATES,
            extra,
            extra_fee: Cents::from(extra) * EXTRA_AFFILIATE_FEE,
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "pro" => Ok(Self::Pro),
            "platinum" => Ok(Self::Platinum),
            _ => Err(format!("invalid plan: {s}")),
        }
    }
}

/// Affiliate overage report for a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateBilling {
    /// Affiliates currently in `active` status.
    pub active: u32,
    /// Affiliates covered by the subscription.
    pub included: u32,
    /// Active affiliates beyond the included count.
    pub extra: u32,
    /// Extra monthly fee in cents.
    pub extra_fee: Cents,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_matrix() {
        assert!(!Plan::Basic.is_allowed(Feature::Coupons));
        assert!(Plan::Pro.is_allowed(Feature::Coupons));
        assert!(Plan::Platinum.is_allowed(Feature::Coupons));

        assert!(!Plan::Basic.is_allowed(Feature::TrackingLinks));
        assert!(Plan::Pro.is_allowed(Feature::TrackingLinks));

        assert!(!Plan::Basic.is_allowed(Feature::ProductVideo));
        assert!(Plan::Pro.is_allowed(Feature::ProductVideo));

        assert!(!Plan::Basic.is_allowed(Feature::Affiliates));
        assert!(!Plan::Pro.is_allowed(Feature::Affiliates));
        assert!(Plan::Platinum.is_allowed(Feature::Affiliates));

        assert!(!Plan::Pro.is_allowed(Feature::AffiliateProducts));
        assert!(Plan::Platinum.is_allowed(Feature::AffiliateProducts));
    }

    #[test]
    fn test_product_caps() {
        assert_eq!(Plan::Basic.max_products(), Some(50));
        assert_eq!(Plan::Pro.max_products(), None);
        assert_eq!(Plan::Platinum.max_products(), None);
    }

    #[test]
    fn test_affiliate_billing_within_allowance() {
        let billing = Plan::Platinum.affiliate_billing(7);
        assert_eq!(billing.extra, 0);
        assert_eq!(billing.extra_fee, 0);
    }

    #[test]
    fn test_affiliate_billing_overage() {
        let billing = Plan::Platinum.affiliate_billing(10);
        assert_eq!(billing.included, 7);
        assert_eq!(billing.extra, 3);
        assert_eq!(billing.extra_fee, 15_000);
    }

    #[test]
    fn test_affiliate_billing_without_program() {
        let billing = Plan::Pro.affiliate_billing(3);
        assert_eq!(billing.included, 0);
        assert_eq!(billing.extra_fee, 0);
    }

    #[test]
    fn test_plan_parse() {
        assert_eq!("platinum".parse::<Plan>().unwrap(), Plan::Platinum);
        assert!("gold".parse::<Plan>().is_err());
        assert_eq!(Plan::default(), Plan::Basic);
    }
}

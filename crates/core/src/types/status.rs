//! Status enums for tenant entities.
//!
//! Every status is stored as snake_case TEXT and serialized the same way on
//! the wire. Lifecycle rules that depend only on the status value (store
//! approval, order transitions) live next to the enum they constrain.

use serde::{Deserialize, Serialize};

/// Implements `as_str`, `Display` and `FromStr` for a unit-only status enum.
macro_rules! text_enum {
    ($name:ident, $label:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Returns the stored text representation.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("invalid ", $label, ": {}"), s)),
                }
            }
        }
    };
}

/// Store lifecycle status.
///
/// `pending -> approved`, `pending -> rejected`, `rejected -> approved` and
/// `rejected -> (deleted)`. Rejection is accepted from any status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlite", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum StoreStatus {
    /// Registered, waiting for a platform admin.
    #[default]
    Pending,
    /// Live; the owner can log in.
    Approved,
    /// Refused by a platform admin.
    Rejected,
}

text_enum!(StoreStatus, "store status" {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

impl StoreStatus {
    /// Whether an admin may approve a store in this status.
    #[must_use]
    pub const fn can_approve(self) -> bool {
        matches!(self, Self::Pending | Self::Rejected)
    }
}

/// Order fulfillment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlite", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    New,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

text_enum!(OrderStatus, "order status" {
    New => "new",
    Confirmed => "confirmed",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

impl OrderStatus {
    /// Terminal statuses accept no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether `self -> next` is an edge of the fulfillment state machine.
    ///
    /// The forward path is `new -> confirmed -> shipped -> delivered`;
    /// `cancelled` is reachable from every non-terminal status.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::New, Self::Confirmed)
            | (Self::Confirmed, Self::Shipped)
            | (Self::Shipped, Self::Delivered) => true,
            (from, Self::Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// On/off switch shared by products, coupons and tracking links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlite", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ActivationStatus {
    #[default]
    Active,
    Inactive,
}

text_enum!(ActivationStatus, "status" {
    Active => "active",
    Inactive => "inactive",
});

impl ActivationStatus {
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Affiliate program membership status.
///
/// Only `active` affiliates earn clicks and commissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlite", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum AffiliateStatus {
    #[default]
    Pending,
    Active,
    Inactive,
}

text_enum!(AffiliateStatus, "affiliate status" {
    Pending => "pending",
    Active => "active",
    Inactive => "inactive",
});

impl AffiliateStatus {
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    /// The status an owner's "toggle" action moves to.
    ///
    /// Active affiliates are paused; pending and inactive ones are activated.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Pending | Self::Inactive => Self::Active,
        }
    }
}

/// How a coupon's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlite", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CouponType {
    /// `value` is a whole percentage between 0 and 100.
    Percentage,
    /// `value` is an amount in cents.
    Fixed,
}

text_enum!(CouponType, "coupon type" {
    Percentage => "percentage",
    Fixed => "fixed",
});

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_store_status_rules() {
        assert!(StoreStatus::Pending.can_approve());
        assert!(StoreStatus::Rejected.can_approve());
        assert!(!StoreStatus::Approved.can_approve());
    }

    #[test]
    fn test_order_forward_path() {
        assert!(OrderStatus::New.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));

        assert!(!OrderStatus::New.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Confirmed));
        assert!(!OrderStatus::New.can_transition_to(OrderStatus::New));
    }

    #[test]
    fn test_order_cancellation_only_from_open_states() {
        for open in [OrderStatus::New, OrderStatus::Confirmed, OrderStatus::Shipped] {
            assert!(open.can_transition_to(OrderStatus::Cancelled));
        }
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::New));
    }

    #[test]
    fn test_affiliate_toggle() {
        assert_eq!(AffiliateStatus::Active.toggled(), AffiliateStatus::Inactive);
        assert_eq!(AffiliateStatus::Inactive.toggled(), AffiliateStatus::Active);
        assert_eq!(AffiliateStatus::Pending.toggled(), AffiliateStatus::Active);
    }

    #[test]
    fn test_text_roundtrip() {
        assert_eq!("rejected".parse::<StoreStatus>().unwrap(), StoreStatus::Rejected);
        assert_eq!(OrderStatus::Cancelled.to_string(), "cancelled");
        assert_eq!(CouponType::Percentage.as_str(), "percentage");
        assert!("archived".parse::<ActivationStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&AffiliateStatus::Pending).unwrap(),
            "\"pending\""
        );
        let status: OrderStatus = serde_json::from_str("\"delivered\"").unwrap();
        assert_eq!(status, OrderStatus::Delivered);
    }
}

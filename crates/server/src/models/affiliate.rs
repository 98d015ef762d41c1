//! Affiliates and the sales attributed to them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use vitrine_core::{AffiliateId, AffiliateStatus, Cents, Email, OrderId, SaleId, StoreId};

/// A referral partner of a store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Affiliate {
    pub id: AffiliateId,
    pub store_id: StoreId,
    pub name: String,
    pub email: Email,
    pub whatsapp: Option<String>,
    pub commission_percentage: i64,
    /// Globally unique referral code.
    pub affiliate_code: String,
    pub total_clicks: i64,
    pub total_sales: i64,
    pub total_commission: Cents,
    pub status: AffiliateStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What an anonymous visitor may learn about an affiliate from its code.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAffiliate {
    pub store_id: StoreId,
    pub name: String,
    pub affiliate_code: String,
}

impl From<&Affiliate> for PublicAffiliate {
    fn from(affiliate: &Affiliate) -> Self {
        Self {
            store_id: affiliate.store_id,
            name: affiliate.name.clone(),
            affiliate_code: affiliate.affiliate_code.clone(),
        }
    }
}

/// Immutable attribution record.
///
/// `commission_percentage` is a snapshot taken when the sale was recorded;
/// later changes to the affiliate never rewrite it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: SaleId,
    pub store_id: StoreId,
    pub order_id: OrderId,
    pub affiliate_code: Option<String>,
    pub affiliate_id: Option<AffiliateId>,
    pub tracking_link: Option<String>,
    pub sale_value: Cents,
    pub commission_percentage: i64,
    pub commission_value: Cents,
    pub customer_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

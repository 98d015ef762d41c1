//! Affiliate program: membership, click tracking and sale attribution.
//!
//! Attribution runs after an order is committed and never fails it. A
//! sale snapshots the commission percentage in force at the time, so later
//! edits to the affiliate do not rewrite history.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::instrument;

use vitrine_core::{
    AffiliateBilling, AffiliateId, AffiliateStatus, Email, Feature, percentage_of,
};

use super::auth::AuthError;
use super::codes::generate_affiliate_code;
use super::sessions::StoreOwner;
use super::{ensure_feature, optional, required};
use crate::db::{
    AffiliateRepository, NewAffiliate, NewSale, RepositoryError, SaleRepository, StoreRepository,
};
use crate::error::AppError;
use crate::models::{Affiliate, Order, PublicAffiliate, Sale, Store};

/// Codes drawn before giving up on a new affiliate.
const MAX_CODE_ATTEMPTS: usize = 5;

/// New affiliate form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateInput {
    pub name: String,
    pub email: String,
    pub whatsapp: Option<String>,
    pub commission_percentage: i64,
}

/// Partial affiliate update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub whatsapp: Option<String>,
    pub commission_percentage: Option<i64>,
    pub status: Option<AffiliateStatus>,
}

/// Result of enrolling an affiliate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAffiliate {
    pub id: AffiliateId,
    pub affiliate_code: String,
}

/// Affiliate program service.
pub struct AffiliateService<'a> {
    affiliates: AffiliateRepository<'a>,
    sales: SaleRepository<'a>,
    stores: StoreRepository<'a>,
}

impl<'a> AffiliateService<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            affiliates: AffiliateRepository::new(pool),
            sales: SaleRepository::new(pool),
            stores: StoreRepository::new(pool),
        }
    }

    /// Enroll an active affiliate in the owner's store.
    ///
    /// The referral code is drawn from the name and redrawn on collision.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` if the plan has no affiliate program
    /// and `AppError::BadRequest` for invalid input.
    #[instrument(skip(self, owner, input), fields(store_id = %owner.store_id))]
    pub async fn create(
        &self,
        owner: &StoreOwner,
        input: AffiliateInput,
    ) -> Result<CreatedAffiliate, AppError> {
        self.ensure_program(owner).await?;

        let name = required("name", &input.name)?;
        validate_commission(input.commission_percentage)?;
        let mut new_affiliate = NewAffiliate {
            store_id: owner.store_id,
            email: Email::parse(&input.email).map_err(AuthError::from)?,
            whatsapp: optional(input.whatsapp),
            commission_percentage: input.commission_percentage,
            affiliate_code: generate_affiliate_code(&name),
            status: AffiliateStatus::Active,
            name,
        };

        for _ in 0..MAX_CODE_ATTEMPTS {
            match self.affiliates.create(&new_affiliate).await {
                Ok(affiliate) => {
                    tracing::info!(
                        affiliate_id = %affiliate.id,
                        code = %affiliate.affiliate_code,
                        "Affiliate enrolled"
                    );
                    return Ok(CreatedAffiliate {
                        id: affiliate.id,
                        affiliate_code: affiliate.affiliate_code,
                    });
                }
                Err(RepositoryError::Conflict(_)) => {
                    new_affiliate.affiliate_code = generate_affiliate_code(&new_affiliate.name);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::Conflict(
            "could not generate a unique affiliate code".to_string(),
        ))
    }

    /// Every affiliate of the owner's store.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list(&self, owner: &StoreOwner) -> Result<Vec<Affiliate>, AppError> {
        Ok(self.affiliates.list_by_store(owner.store_id).await?)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound`, `AppError::Forbidden` for another store
    /// or a plan without affiliates, and `AppError::BadRequest` for invalid
    /// input.
    #[instrument(skip(self, owner, update), fields(store_id = %owner.store_id))]
    pub async fn update(
        &self,
        owner: &StoreOwner,
        id: AffiliateId,
        update: AffiliateUpdate,
    ) -> Result<Affiliate, AppError> {
        let mut affiliate = self.owned(owner, id).await?;
        self.ensure_program(owner).await?;

        if let Some(name) = update.name {
            affiliate.name = required("name", &name)?;
        }
        if let Some(email) = update.email {
            affiliate.email = Email::parse(&email).map_err(AuthError::from)?;
        }
        if update.whatsapp.is_some() {
            affiliate.whatsapp = optional(update.whatsapp);
        }
        if let Some(commission) = update.commission_percentage {
            validate_commission(commission)?;
            affiliate.commission_percentage = commission;
        }
        if let Some(status) = update.status {
            affiliate.status = status;
        }

        Ok(self.affiliates.update(&affiliate).await?)
    }

    /// Flip an affiliate between active and inactive. Pending affiliates
    /// become active.
    ///
    /// # Errors
    ///
    /// Same as [`Self::update`].
    #[instrument(skip(self, owner), fields(store_id = %owner.store_id))]
    pub async fn toggle_status(
        &self,
        owner: &StoreOwner,
        id: AffiliateId,
    ) -> Result<Affiliate, AppError> {
        let mut affiliate = self.owned(owner, id).await?;
        self.ensure_program(owner).await?;

        affiliate.status = affiliate.status.toggled();
        let affiliate = self.affiliates.update(&affiliate).await?;

        tracing::info!(affiliate_id = %id, status = %affiliate.status, "Affiliate toggled");
        Ok(affiliate)
    }

    /// Remove an affiliate. Their recorded sales are kept.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` or `AppError::Forbidden` for another store.
    #[instrument(skip(self, owner), fields(store_id = %owner.store_id))]
    pub async fn delete(&self, owner: &StoreOwner, id: AffiliateId) -> Result<(), AppError> {
        self.owned(owner, id).await?;
        self.affiliates.delete(id).await?;
        tracing::info!(affiliate_id = %id, "Affiliate deleted");
        Ok(())
    }

    /// Overage report for the owner's store. Informational only.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the store vanished.
    pub async fn billing(&self, owner: &StoreOwner) -> Result<AffiliateBilling, AppError> {
        let store = self.owner_store(owner).await?;
        let active = self.affiliates.count_active(store.id).await?;
        let active = u32::try_from(active).unwrap_or(u32::MAX);
        Ok(store.plan.affiliate_billing(active))
    }

    /// Every sale of the owner's store.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list_sales(&self, owner: &StoreOwner) -> Result<Vec<Sale>, AppError> {
        Ok(self.sales.list_by_store(owner.store_id).await?)
    }

    /// Sales credited to one of the owner's affiliates.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` or `AppError::Forbidden` for another store.
    pub async fn list_sales_by_affiliate(
        &self,
        owner: &StoreOwner,
        id: AffiliateId,
    ) -> Result<Vec<Sale>, AppError> {
        self.owned(owner, id).await?;
        Ok(self.sales.list_by_affiliate(id).await?)
    }

    /// Public profile behind a referral code.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` unless an active affiliate has this code.
    pub async fn get_public_by_code(&self, code: &str) -> Result<PublicAffiliate, AppError> {
        self.affiliates
            .get_by_code(code)
            .await?
            .filter(|affiliate| affiliate.status.is_active())
            .map(|affiliate| PublicAffiliate::from(&affiliate))
            .ok_or_else(|| AppError::NotFound(format!("affiliate {code} not found")))
    }

    /// Count a referral click. Returns `false` for unknown or inactive codes.
    ///
    /// Every call counts; deduplication is the client's concern.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the update fails.
    pub async fn track_click(&self, code: &str) -> Result<bool, AppError> {
        let tracked = self.affiliates.record_click(code).await?;
        if !tracked {
            tracing::debug!(code, "Click for unknown or inactive affiliate");
        }
        Ok(tracked)
    }

    /// Credit an order to the affiliate named by its `affiliate_code`.
    ///
    /// Runs after the order is committed. Every failure is logged and
    /// swallowed.
    #[instrument(skip(self, order), fields(order_id = %order.id, store_id = %order.store_id))]
    pub async fn attribute_on_order(&self, order: &Order) -> Option<Sale> {
        let code = order.affiliate_code.as_deref()?;

        let affiliate = match self.affiliates.get_by_code(code).await {
            Ok(Some(affiliate)) => affiliate,
            Ok(None) => {
                tracing::debug!(code, "Order names an unknown affiliate");
                return None;
            }
            Err(e) => {
                tracing::error!(error = %e, code, "Failed to load affiliate for attribution");
                return None;
            }
        };

        if affiliate.store_id != order.store_id {
            tracing::warn!(
                affiliate_id = %affiliate.id,
                affiliate_store_id = %affiliate.store_id,
                "Affiliate belongs to another store; no commission"
            );
            return None;
        }
        if !affiliate.status.is_active() {
            tracing::debug!(affiliate_id = %affiliate.id, "Affiliate is not active; no commission");
            return None;
        }

        let sale = NewSale {
            store_id: order.store_id,
            order_id: order.id,
            affiliate_id: affiliate.id,
            affiliate_code: affiliate.affiliate_code.clone(),
            tracking_link: order.tracking_link.clone(),
            sale_value: order.total,
            commission_percentage: affiliate.commission_percentage,
            commission_value: percentage_of(order.total, affiliate.commission_percentage),
            customer_email: order.customer_email.clone(),
        };

        match self.sales.record_attributed(&sale).await {
            Ok(sale) => {
                tracing::info!(
                    sale_id = %sale.id,
                    affiliate_id = %affiliate.id,
                    commission = sale.commission_value,
                    "Sale attributed to affiliate"
                );
                Some(sale)
            }
            Err(e) => {
                tracing::error!(error = %e, affiliate_id = %affiliate.id, "Failed to record sale");
                None
            }
        }
    }

    async fn owned(&self, owner: &StoreOwner, id: AffiliateId) -> Result<Affiliate, AppError> {
        let affiliate = self
            .affiliates
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("affiliate {id} not found")))?;
        owner.ensure_store(affiliate.store_id)?;
        Ok(affiliate)
    }

    async fn owner_store(&self, owner: &StoreOwner) -> Result<Store, AppError> {
        self.stores
            .get_by_id(owner.store_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("store {} not found", owner.store_id)))
    }

    async fn ensure_program(&self, owner: &StoreOwner) -> Result<(), AppError> {
        let store = self.owner_store(owner).await?;
        ensure_feature(store.plan, Feature::Affiliates)
    }
}

fn validate_commission(percentage: i64) -> Result<(), AppError> {
    if !(0..=100).contains(&percentage) {
        return Err(AppError::BadRequest(
            "commissionPercentage must be between 0 and 100".to_string(),
        ));
    }
    Ok(())
}

//! Coupon management and checkout validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::instrument;

use vitrine_core::{
    ActivationStatus, Cents, CouponId, CouponType, Feature, StoreId, format_brl, percentage_of,
};

use super::ensure_feature;
use super::sessions::StoreOwner;
use crate::db::{CouponRepository, NewCoupon, StoreRepository};
use crate::error::AppError;
use crate::models::Coupon;

/// Outcome of a successful coupon validation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponValidation {
    pub valid: bool,
    pub discount_amount: Cents,
    pub coupon: Coupon,
}

/// Read-only coupon checks run at checkout.
pub struct CouponValidator<'a> {
    coupons: CouponRepository<'a>,
}

impl<'a> CouponValidator<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            coupons: CouponRepository::new(pool),
        }
    }

    /// Check `code` against a purchase of `amount` cents at `now`.
    ///
    /// Codes are normalized when a coupon is written; the lookup here is an
    /// exact, case-sensitive match.
    ///
    /// Checks run in order: existence, status, validity window, usage limit,
    /// minimum purchase. The first failure is returned.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown code and
    /// `AppError::BadRequest` naming the failed check otherwise.
    pub async fn validate(
        &self,
        store_id: StoreId,
        code: &str,
        amount: Cents,
        now: DateTime<Utc>,
    ) -> Result<CouponValidation, AppError> {
        let coupon = self
            .coupons
            .get_by_code(store_id, code)
            .await?
            .ok_or_else(|| AppError::NotFound("coupon not found".to_string()))?;

        let discount_amount = evaluate(&coupon, amount, now)?;
        Ok(CouponValidation {
            valid: true,
            discount_amount,
            coupon,
        })
    }
}

/// Apply the validation rules to a loaded coupon and compute its discount.
///
/// Percentage discounts round down; fixed discounts are the coupon value,
/// uncapped by the purchase amount.
///
/// # Errors
///
/// Returns `AppError::BadRequest` naming the first failed check.
pub fn evaluate(coupon: &Coupon, amount: Cents, now: DateTime<Utc>) -> Result<Cents, AppError> {
    if !coupon.status.is_active() {
        return Err(AppError::BadRequest("coupon is inactive".to_string()));
    }
    if !coupon.is_within_window(now) {
        return Err(AppError::BadRequest(
            "coupon is outside its validity window".to_string(),
        ));
    }
    if coupon.is_exhausted() {
        return Err(AppError::BadRequest("coupon usage limit reached".to_string()));
    }
    if amount < coupon.min_purchase {
        return Err(AppError::BadRequest(format!(
            "minimum purchase of {} required",
            format_brl(coupon.min_purchase)
        )));
    }

    Ok(match coupon.kind {
        CouponType::Percentage => percentage_of(amount, coupon.value),
        CouponType::Fixed => coupon.value,
    })
}

/// New coupon form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponInput {
    pub code: String,
    #[serde(rename = "type")]
    pub kind: CouponType,
    pub value: i64,
    #[serde(default)]
    pub min_purchase: Cents,
    #[serde(default)]
    pub max_uses: i64,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

/// Partial coupon update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponUpdate {
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<CouponType>,
    pub value: Option<i64>,
    pub min_purchase: Option<Cents>,
    pub max_uses: Option<i64>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub status: Option<ActivationStatus>,
}

/// Coupon management for store owners.
pub struct CouponService<'a> {
    coupons: CouponRepository<'a>,
    stores: StoreRepository<'a>,
}

impl<'a> CouponService<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            coupons: CouponRepository::new(pool),
            stores: StoreRepository::new(pool),
        }
    }

    /// Create a coupon for the owner's store.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` if the plan has no coupons,
    /// `AppError::BadRequest` for invalid input and `AppError::Conflict` if
    /// the code is taken in this store.
    #[instrument(skip(self, owner, input), fields(store_id = %owner.store_id))]
    pub async fn create(&self, owner: &StoreOwner, input: CouponInput) -> Result<Coupon, AppError> {
        self.ensure_coupons(owner).await?;

        let coupon = NewCoupon {
            store_id: owner.store_id,
            code: normalize_code(&input.code)?,
            kind: input.kind,
            value: input.value,
            min_purchase: input.min_purchase,
            max_uses: input.max_uses,
            valid_from: input.valid_from,
            valid_until: input.valid_until,
        };
        validate_terms(
            coupon.kind,
            coupon.value,
            coupon.min_purchase,
            coupon.max_uses,
            coupon.valid_from,
            coupon.valid_until,
        )?;

        let coupon = self.coupons.create(&coupon).await?;
        tracing::info!(coupon_id = %coupon.id, code = %coupon.code, "Coupon created");
        Ok(coupon)
    }

    /// Every coupon of the owner's store.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list(&self, owner: &StoreOwner) -> Result<Vec<Coupon>, AppError> {
        Ok(self.coupons.list_by_store(owner.store_id).await?)
    }

    /// Apply a partial update. Usage counts are never editable.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound`, `AppError::Forbidden` for another store
    /// or a plan without coupons, and `AppError::BadRequest` for invalid
    /// input.
    #[instrument(skip(self, owner, update), fields(store_id = %owner.store_id))]
    pub async fn update(
        &self,
        owner: &StoreOwner,
        id: CouponId,
        update: CouponUpdate,
    ) -> Result<Coupon, AppError> {
        let mut coupon = self.owned(owner, id).await?;
        self.ensure_coupons(owner).await?;

        if let Some(code) = update.code {
            coupon.code = normalize_code(&code)?;
        }
        if let Some(kind) = update.kind {
            coupon.kind = kind;
        }
        if let Some(value) = update.value {
            coupon.value = value;
        }
        if let Some(min_purchase) = update.min_purchase {
            coupon.min_purchase = min_purchase;
        }
        if let Some(max_uses) = update.max_uses {
            coupon.max_uses = max_uses;
        }
        if let Some(valid_from) = update.valid_from {
            coupon.valid_from = valid_from;
        }
        if let Some(valid_until) = update.valid_until {
            coupon.valid_until = valid_until;
        }
        if let Some(status) = update.status {
            coupon.status = status;
        }
        validate_terms(
            coupon.kind,
            coupon.value,
            coupon.min_purchase,
            coupon.max_uses,
            coupon.valid_from,
            coupon.valid_until,
        )?;

        Ok(self.coupons.update(&coupon).await?)
    }

    /// Delete one of the owner's coupons.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` or `AppError::Forbidden` for another store.
    #[instrument(skip(self, owner), fields(store_id = %owner.store_id))]
    pub async fn delete(&self, owner: &StoreOwner, id: CouponId) -> Result<(), AppError> {
        self.owned(owner, id).await?;
        self.coupons.delete(id).await?;
        tracing::info!(coupon_id = %id, "Coupon deleted");
        Ok(())
    }

    async fn owned(&self, owner: &StoreOwner, id: CouponId) -> Result<Coupon, AppError> {
        let coupon = self
            .coupons
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("coupon {id} not found")))?;
        owner.ensure_store(coupon.store_id)?;
        Ok(coupon)
    }

    async fn ensure_coupons(&self, owner: &StoreOwner) -> Result<(), AppError> {
        let store = self
            .stores
            .get_by_id(owner.store_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("store {} not found", owner.store_id)))?;
        ensure_feature(store.plan, Feature::Coupons)
    }
}

fn normalize_code(code: &str) -> Result<String, AppError> {
    let code = code.trim().to_uppercase();
    if code.is_empty() {
        return Err(AppError::BadRequest("code is required".to_string()));
    }
    Ok(code)
}

fn validate_terms(
    kind: CouponType,
    value: i64,
    min_purchase: Cents,
    max_uses: i64,
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
) -> Result<(), AppError> {
    match kind {
        CouponType::Percentage if !(0..=100).contains(&value) => {
            return Err(AppError::BadRequest(
                "percentage must be between 0 and 100".to_string(),
            ));
        }
        CouponType::Fixed if value < 0 => {
            return Err(AppError::BadRequest("value must not be negative".to_string()));
        }
        _ => {}
    }
    if min_purchase < 0 || max_uses < 0 {
        return Err(AppError::BadRequest(
            "minPurchase and maxUses must not be negative".to_string(),
        ));
    }
    if valid_from > valid_until {
        return Err(AppError::BadRequest(
            "validFrom must not be after validUntil".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn coupon(kind: CouponType, value: i64) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: CouponId::new(1),
            store_id: StoreId::new(1),
            code: "PROMO".to_string(),
            kind,
            value,
            min_purchase: 0,
            max_uses: 0,
            current_uses: 0,
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(1),
            status: ActivationStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_percentage_discount() {
        let coupon = coupon(CouponType::Percentage, 10);
        assert_eq!(evaluate(&coupon, 10_000, Utc::now()).unwrap(), 1_000);
        assert_eq!(evaluate(&coupon, 999, Utc::now()).unwrap(), 99);
    }

    #[test]
    fn test_fixed_discount_ignores_amount() {
        let coupon = coupon(CouponType::Fixed, 500);
        assert_eq!(evaluate(&coupon, 100_000, Utc::now()).unwrap(), 500);
        assert_eq!(evaluate(&coupon, 300, Utc::now()).unwrap(), 500);
    }

    #[test]
    fn test_rejections_in_order() {
        let now = Utc::now();

        let mut inactive = coupon(CouponType::Fixed, 500);
        inactive.status = ActivationStatus::Inactive;
        inactive.valid_until = now - Duration::hours(1);
        let err = evaluate(&inactive, 1_000, now).unwrap_err();
        assert_eq!(err.to_string(), "Bad request: coupon is inactive");

        let mut expired = coupon(CouponType::Fixed, 500);
        expired.valid_until = now - Duration::hours(1);
        expired.max_uses = 1;
        expired.current_uses = 1;
        let err = evaluate(&expired, 1_000, now).unwrap_err();
        assert!(err.to_string().contains("validity window"));

        let mut exhausted = coupon(CouponType::Fixed, 500);
        exhausted.max_uses = 3;
        exhausted.current_uses = 3;
        exhausted.min_purchase = 50_000;
        let err = evaluate(&exhausted, 1_000, now).unwrap_err();
        assert!(err.to_string().contains("usage limit"));

        let mut minimum = coupon(CouponType::Fixed, 500);
        minimum.min_purchase = 5_000;
        let err = evaluate(&minimum, 4_999, now).unwrap_err();
        assert!(err.to_string().contains("minimum purchase of R$ 50.00 required"));
        assert_eq!(evaluate(&minimum, 5_000, now).unwrap(), 500);
    }

    #[test]
    fn test_unlimited_coupon_is_never_exhausted() {
        let mut unlimited = coupon(CouponType::Percentage, 5);
        unlimited.current_uses = 10_000;
        assert!(evaluate(&unlimited, 1_000, Utc::now()).is_ok());
    }

    #[test]
    fn test_validate_terms() {
        let now = Utc::now();
        let later = now + Duration::days(30);

        assert!(validate_terms(CouponType::Percentage, 100, 0, 0, now, later).is_ok());
        assert!(validate_terms(CouponType::Percentage, 101, 0, 0, now, later).is_err());
        assert!(validate_terms(CouponType::Fixed, 10_000, 0, 0, now, later).is_ok());
        assert!(validate_terms(CouponType::Fixed, -1, 0, 0, now, later).is_err());
        assert!(validate_terms(CouponType::Fixed, 10, 0, 0, later, now).is_err());
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  verao10 ").unwrap(), "VERAO10");
        assert!(normalize_code("   ").is_err());
    }
}

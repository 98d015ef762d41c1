//! Checkout: coupons, order totals, status transitions and attribution.

use chrono::{Duration, Utc};
use vitrine_core::{CouponType, OrderStatus, Plan};
use vitrine_integration_tests::{
    TestContext, approved_store, coupon_input, order_input, product_input, register_store,
};
use vitrine_server::error::AppError;
use vitrine_server::services::{
    AffiliateInput, AffiliateService, AffiliateUpdate, CouponService, CouponValidator,
    OrderService, ProductService, StoreOwner, TrackingLinkInput, TrackingLinkService,
};

async fn product_id(ctx: &TestContext, owner: &StoreOwner, price: i64) -> vitrine_core::ProductId {
    ProductService::new(&ctx.pool)
        .create(owner, product_input("Produto", price))
        .await
        .expect("product")
        .id
}

async fn enroll(ctx: &TestContext, owner: &StoreOwner, commission: i64) -> (vitrine_core::AffiliateId, String) {
    let created = AffiliateService::new(&ctx.pool)
        .create(
            owner,
            AffiliateInput {
                name: "Influencer".to_string(),
                email: "influencer@example.com".to_string(),
                whatsapp: None,
                commission_percentage: commission,
            },
        )
        .await
        .expect("affiliate");
    (created.id, created.affiliate_code)
}

// ============================================================================
// Coupon validation
// ============================================================================

#[tokio::test]
async fn test_coupon_discounts() {
    let ctx = TestContext::new().await;
    let owner = approved_store(&ctx.pool, "Loja Cupom", "cupom@example.com", Plan::Pro).await;
    let coupons = CouponService::new(&ctx.pool);
    coupons
        .create(&owner, coupon_input("dez", CouponType::Percentage, 10))
        .await
        .expect("percentage coupon");
    coupons
        .create(&owner, coupon_input("CINCO", CouponType::Fixed, 500))
        .await
        .expect("fixed coupon");

    let validator = CouponValidator::new(&ctx.pool);
    let now = Utc::now();

    let result = validator
        .validate(owner.store_id, "DEZ", 10_000, now)
        .await
        .expect("valid");
    assert!(result.valid);
    assert_eq!(result.discount_amount, 1_000);

    for amount in [300, 600, 100_000] {
        let result = validator
            .validate(owner.store_id, "CINCO", amount, now)
            .await
            .expect("valid");
        assert_eq!(result.discount_amount, 500);
    }

    // Codes are upper-cased on write and matched exactly on lookup.
    for code in ["cinco", "Dez"] {
        let err = validator
            .validate(owner.store_id, code, 10_000, now)
            .await
            .expect_err("lookup is case-sensitive");
        assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");
    }

    let err = validator
        .validate(owner.store_id, "NADA", 10_000, now)
        .await
        .expect_err("unknown code");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_coupon_rejections() {
    let ctx = TestContext::new().await;
    let owner = approved_store(&ctx.pool, "Loja Cupom", "cupom@example.com", Plan::Pro).await;
    let coupons = CouponService::new(&ctx.pool);

    let mut minimum = coupon_input("MINIMO", CouponType::Fixed, 1_000);
    minimum.min_purchase = 5_000;
    coupons.create(&owner, minimum).await.expect("coupon");
    let window = coupon_input("JANELA", CouponType::Percentage, 5);
    let valid_until = window.valid_until;
    coupons.create(&owner, window).await.expect("coupon");

    let validator = CouponValidator::new(&ctx.pool);

    let err = validator
        .validate(owner.store_id, "MINIMO", 4_000, Utc::now())
        .await
        .expect_err("below minimum");
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = validator
        .validate(owner.store_id, "JANELA", 4_000, valid_until + Duration::seconds(1))
        .await
        .expect_err("expired");
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = coupons
        .create(&owner, coupon_input("DEMAIS", CouponType::Percentage, 150))
        .await
        .expect_err("percentage over 100");
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = coupons
        .create(&owner, coupon_input("minimo", CouponType::Fixed, 1))
        .await
        .expect_err("duplicate code");
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_order_redeems_coupon_until_exhausted() {
    let ctx = TestContext::new().await;
    let owner = approved_store(&ctx.pool, "Loja Cupom", "cupom@example.com", Plan::Pro).await;
    let product = product_id(&ctx, &owner, 10_000).await;

    let mut single_use = coupon_input("UNICO", CouponType::Percentage, 10);
    single_use.max_uses = 1;
    CouponService::new(&ctx.pool)
        .create(&owner, single_use)
        .await
        .expect("coupon");

    let orders = OrderService::new(&ctx.pool);
    let mut order = order_input(owner.store_id, product, 10_000, 1);
    order.coupon_code = Some("UNICO".to_string());
    order.discount = 1_000;
    order.total = 9_000;
    orders
        .create(order.clone(), Utc::now())
        .await
        .expect("first order");

    let coupons = CouponService::new(&ctx.pool).list(&owner).await.expect("list");
    assert_eq!(coupons.first().map(|c| c.current_uses), Some(1));

    let err = orders
        .create(order, Utc::now())
        .await
        .expect_err("exhausted coupon");
    assert!(matches!(err, AppError::BadRequest(_) | AppError::Conflict(_)), "got {err:?}");
    assert_eq!(orders.list(&owner).await.expect("orders").len(), 1);
}

#[tokio::test]
async fn test_order_rejects_wrong_coupon_discount() {
    let ctx = TestContext::new().await;
    let owner = approved_store(&ctx.pool, "Loja Cupom", "cupom@example.com", Plan::Pro).await;
    let product = product_id(&ctx, &owner, 10_000).await;
    CouponService::new(&ctx.pool)
        .create(&owner, coupon_input("DEZ", CouponType::Percentage, 10))
        .await
        .expect("coupon");

    let mut order = order_input(owner.store_id, product, 10_000, 1);
    order.coupon_code = Some("DEZ".to_string());
    order.discount = 5_000;
    order.total = 5_000;

    let err = OrderService::new(&ctx.pool)
        .create(order, Utc::now())
        .await
        .expect_err("inflated discount");
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_fixed_coupon_larger_than_subtotal_discounts_whole_subtotal() {
    let ctx = TestContext::new().await;
    let owner = approved_store(&ctx.pool, "Loja Cupom", "cupom@example.com", Plan::Pro).await;
    let product = product_id(&ctx, &owner, 300).await;
    CouponService::new(&ctx.pool)
        .create(&owner, coupon_input("CINCO", CouponType::Fixed, 500))
        .await
        .expect("coupon");
    let orders = OrderService::new(&ctx.pool);

    let mut order = order_input(owner.store_id, product, 300, 1);
    order.coupon_code = Some("CINCO".to_string());
    order.discount = 500;
    order.total = 0;
    let err = orders
        .create(order.clone(), Utc::now())
        .await
        .expect_err("discount above the subtotal");
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    order.discount = 300;
    order.shipping = 1_000;
    order.total = 1_000;
    orders
        .create(order, Utc::now())
        .await
        .expect("discount capped at the subtotal");

    let placed = orders.list(&owner).await.expect("orders");
    assert_eq!(placed.first().map(|o| (o.discount, o.total)), Some((300, 1_000)));
    let coupons = CouponService::new(&ctx.pool).list(&owner).await.expect("list");
    assert_eq!(coupons.first().map(|c| c.current_uses), Some(1));
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn test_order_totals_are_verified() {
    let ctx = TestContext::new().await;
    let owner = approved_store(&ctx.pool, "Loja Total", "total@example.com", Plan::Basic).await;
    let product = product_id(&ctx, &owner, 2_500).await;
    let orders = OrderService::new(&ctx.pool);

    let mut order = order_input(owner.store_id, product, 2_500, 2);
    order.shipping = 1_000;
    order.total = 6_000;
    let created = orders.create(order.clone(), Utc::now()).await.expect("order");
    assert!(created.order_number.starts_with("ORD-"));

    order.total = 5_999;
    let err = orders
        .create(order, Utc::now())
        .await
        .expect_err("bad total");
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_orders_need_an_approved_store() {
    let ctx = TestContext::new().await;
    let store_id = register_store(&ctx.pool, "Loja Fila", "fila@example.com", Plan::Basic).await;

    let err = OrderService::new(&ctx.pool)
        .create(
            order_input(store_id, vitrine_core::ProductId::new(1), 1_000, 1),
            Utc::now(),
        )
        .await
        .expect_err("pending store");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_order_status_machine() {
    let ctx = TestContext::new().await;
    let owner = approved_store(&ctx.pool, "Loja Fluxo", "fluxo@example.com", Plan::Basic).await;
    let product = product_id(&ctx, &owner, 1_000).await;
    let orders = OrderService::new(&ctx.pool);
    let id = orders
        .create(order_input(owner.store_id, product, 1_000, 1), Utc::now())
        .await
        .expect("order")
        .id;

    let err = orders
        .update_status(&owner, id, OrderStatus::Delivered)
        .await
        .expect_err("skipping steps");
    assert!(matches!(err, AppError::BadRequest(_)));

    for status in [
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        let order = orders
            .update_status(&owner, id, status)
            .await
            .expect("legal transition");
        assert_eq!(order.status, status);
    }

    let err = orders
        .update_status(&owner, id, OrderStatus::Cancelled)
        .await
        .expect_err("delivered orders cannot be cancelled");
    assert!(matches!(err, AppError::BadRequest(_)));

    let other = approved_store(&ctx.pool, "Loja Outra", "outra@example.com", Plan::Basic).await;
    let err = orders.get(&other, id).await.expect_err("foreign order");
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_order_counts_tracking_link_conversion() {
    let ctx = TestContext::new().await;
    let owner = approved_store(&ctx.pool, "Loja Links", "links@example.com", Plan::Pro).await;
    let product = product_id(&ctx, &owner, 1_000).await;
    let links = TrackingLinkService::new(&ctx.pool);
    links
        .create(
            &owner,
            TrackingLinkInput {
                name: "Stories".to_string(),
                slug: "stories".to_string(),
                target_url: "https://example.com".to_string(),
                product_id: Some(product),
            },
        )
        .await
        .expect("link");

    let mut order = order_input(owner.store_id, product, 1_000, 1);
    order.tracking_link = Some("stories".to_string());
    OrderService::new(&ctx.pool)
        .create(order, Utc::now())
        .await
        .expect("order");

    let listed = links.list(&owner).await.expect("links");
    assert_eq!(listed.first().map(|l| l.conversions), Some(1));
}

// ============================================================================
// Affiliate attribution
// ============================================================================

#[tokio::test]
async fn test_attribution_records_commission_snapshot() {
    let ctx = TestContext::new().await;
    let owner = approved_store(&ctx.pool, "Loja Top", "top@example.com", Plan::Platinum).await;
    let product = product_id(&ctx, &owner, 20_000).await;
    let (affiliate_id, code) = enroll(&ctx, &owner, 15).await;

    let mut order = order_input(owner.store_id, product, 20_000, 1);
    order.affiliate_code = Some(code);
    OrderService::new(&ctx.pool)
        .create(order, Utc::now())
        .await
        .expect("order");

    let affiliates = AffiliateService::new(&ctx.pool);
    let sales = affiliates
        .list_sales_by_affiliate(&owner, affiliate_id)
        .await
        .expect("sales");
    assert_eq!(sales.len(), 1);
    let sale = sales.first().expect("sale");
    assert_eq!(sale.sale_value, 20_000);
    assert_eq!(sale.commission_percentage, 15);
    assert_eq!(sale.commission_value, 3_000);

    let affiliate = affiliates
        .update(
            &owner,
            affiliate_id,
            AffiliateUpdate {
                commission_percentage: Some(30),
                ..AffiliateUpdate::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(affiliate.total_sales, 1);
    assert_eq!(affiliate.total_commission, 3_000);

    let sales = affiliates.list_sales(&owner).await.expect("sales");
    assert_eq!(sales.first().map(|s| s.commission_percentage), Some(15));
    assert_eq!(sales.first().map(|s| s.commission_value), Some(3_000));
}

#[tokio::test]
async fn test_affiliate_of_another_store_earns_nothing() {
    let ctx = TestContext::new().await;
    let store_a = approved_store(&ctx.pool, "Loja A", "a@example.com", Plan::Platinum).await;
    let store_b = approved_store(&ctx.pool, "Loja B", "b@example.com", Plan::Platinum).await;
    let (affiliate_id, code) = enroll(&ctx, &store_a, 20).await;
    let product = product_id(&ctx, &store_b, 10_000).await;

    let mut order = order_input(store_b.store_id, product, 10_000, 1);
    order.affiliate_code = Some(code);
    OrderService::new(&ctx.pool)
        .create(order, Utc::now())
        .await
        .expect("order still succeeds");

    let affiliates = AffiliateService::new(&ctx.pool);
    assert!(affiliates.list_sales(&store_b).await.expect("sales").is_empty());
    assert!(
        affiliates
            .list_sales_by_affiliate(&store_a, affiliate_id)
            .await
            .expect("sales")
            .is_empty()
    );
}

#[tokio::test]
async fn test_unknown_affiliate_code_does_not_fail_order() {
    let ctx = TestContext::new().await;
    let owner = approved_store(&ctx.pool, "Loja Top", "top@example.com", Plan::Platinum).await;
    let product = product_id(&ctx, &owner, 5_000).await;

    let mut order = order_input(owner.store_id, product, 5_000, 1);
    order.affiliate_code = Some("NINGUEM-0000".to_string());
    order.tracking_link = Some("nao-existe".to_string());
    OrderService::new(&ctx.pool)
        .create(order, Utc::now())
        .await
        .expect("order");

    assert!(
        AffiliateService::new(&ctx.pool)
            .list_sales(&owner)
            .await
            .expect("sales")
            .is_empty()
    );
}

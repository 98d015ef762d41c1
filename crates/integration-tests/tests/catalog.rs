//! Plan entitlements on the catalog and marketing tools.

use vitrine_core::{ActivationStatus, CouponType, Plan};
use vitrine_integration_tests::{TestContext, approved_store, coupon_input, product_input};
use vitrine_server::error::AppError;
use vitrine_server::services::{
    AffiliateInput, AffiliateService, CouponService, ProductService, ProductUpdate,
    TrackingLinkInput, TrackingLinkService, TrackingLinkUpdate,
};

fn link_input(name: &str, slug: &str) -> TrackingLinkInput {
    TrackingLinkInput {
        name: name.to_string(),
        slug: slug.to_string(),
        target_url: "https://example.com/promo".to_string(),
        product_id: None,
    }
}

fn affiliate_input(email: &str, commission: i64) -> AffiliateInput {
    AffiliateInput {
        name: "Parceiro".to_string(),
        email: email.to_string(),
        whatsapp: None,
        commission_percentage: commission,
    }
}

// ============================================================================
// Basic plan
// ============================================================================

#[tokio::test]
async fn test_basic_store_product_cap() {
    let ctx = TestContext::new().await;
    let owner = approved_store(&ctx.pool, "Loja Basica", "basica@example.com", Plan::Basic).await;
    let products = ProductService::new(&ctx.pool);

    for i in 0..49 {
        products
            .create(&owner, product_input(&format!("Produto {i}"), 1_000))
            .await
            .expect("products up to the cap");
    }

    // Two creates racing for the last slot: exactly one gets it.
    let (first, second) = tokio::join!(
        products.create(&owner, product_input("Produto 49a", 1_000)),
        products.create(&owner, product_input("Produto 49b", 1_000)),
    );
    assert_eq!(u8::from(first.is_ok()) + u8::from(second.is_ok()), 1);
    for result in [first, second] {
        if let Err(err) = result {
            assert!(matches!(err, AppError::Forbidden(_)), "got {err:?}");
        }
    }

    let err = products
        .create(&owner, product_input("Produto 51", 1_000))
        .await
        .expect_err("51st product");
    assert!(matches!(err, AppError::Forbidden(_)), "got {err:?}");
    assert_eq!(products.list(&owner).await.expect("list").len(), 50);
}

#[tokio::test]
async fn test_basic_store_has_no_premium_features() {
    let ctx = TestContext::new().await;
    let owner = approved_store(&ctx.pool, "Loja Basica", "basica@example.com", Plan::Basic).await;

    let mut with_video = product_input("Video", 1_000);
    with_video.video_url = Some("https://example.com/video.mp4".to_string());
    let err = ProductService::new(&ctx.pool)
        .create(&owner, with_video)
        .await
        .expect_err("video");
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = CouponService::new(&ctx.pool)
        .create(&owner, coupon_input("DEZ", CouponType::Percentage, 10))
        .await
        .expect_err("coupons");
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = TrackingLinkService::new(&ctx.pool)
        .create(&owner, link_input("Insta", "insta"))
        .await
        .expect_err("tracking links");
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = AffiliateService::new(&ctx.pool)
        .create(&owner, affiliate_input("p@example.com", 10))
        .await
        .expect_err("affiliates");
    assert!(matches!(err, AppError::Forbidden(_)));

    ProductService::new(&ctx.pool)
        .create(&owner, product_input("Simples", 1_000))
        .await
        .expect("plain products are still allowed");
}

#[tokio::test]
async fn test_pro_store_has_coupons_but_no_affiliates() {
    let ctx = TestContext::new().await;
    let owner = approved_store(&ctx.pool, "Loja Pro", "pro@example.com", Plan::Pro).await;

    CouponService::new(&ctx.pool)
        .create(&owner, coupon_input("dez", CouponType::Percentage, 10))
        .await
        .expect("coupon");
    let err = AffiliateService::new(&ctx.pool)
        .create(&owner, affiliate_input("p@example.com", 10))
        .await
        .expect_err("affiliates");
    assert!(matches!(err, AppError::Forbidden(_)));

    let billing = AffiliateService::new(&ctx.pool)
        .billing(&owner)
        .await
        .expect("billing");
    assert_eq!(billing.included, 0);
}

// ============================================================================
// Products
// ============================================================================

#[tokio::test]
async fn test_product_update_and_public_listing() {
    let ctx = TestContext::new().await;
    let owner = approved_store(&ctx.pool, "Loja Pro", "pro@example.com", Plan::Pro).await;
    let products = ProductService::new(&ctx.pool);

    let mut input = product_input("Vestido", 12_000);
    input.video_url = Some("https://example.com/v.mp4".to_string());
    let visible = products.create(&owner, input).await.expect("product");
    let hidden = products
        .create(&owner, product_input("Saia", 8_000))
        .await
        .expect("product");

    let updated = products
        .update(
            &owner,
            visible.id,
            ProductUpdate {
                price: Some(11_000),
                video_url: Some(String::new()),
                ..ProductUpdate::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.price, 11_000);
    assert!(updated.video_url.is_none());
    assert_eq!(updated.name, "Vestido");
    assert_eq!(updated.stock, Some(10), "stock untouched when absent");

    let untracked = products
        .update(
            &owner,
            visible.id,
            ProductUpdate {
                stock: Some(None),
                ..ProductUpdate::default()
            },
        )
        .await
        .expect("stop tracking stock");
    assert_eq!(untracked.stock, None);

    let err = products
        .update(
            &owner,
            visible.id,
            ProductUpdate {
                stock: Some(Some(-3)),
                ..ProductUpdate::default()
            },
        )
        .await
        .expect_err("negative stock");
    assert!(matches!(err, AppError::BadRequest(_)));

    products
        .update(
            &owner,
            hidden.id,
            ProductUpdate {
                status: Some(ActivationStatus::Inactive),
                ..ProductUpdate::default()
            },
        )
        .await
        .expect("deactivate");

    let public = products.list_public(owner.store_id).await.expect("public");
    assert_eq!(public.len(), 1);
    assert_eq!(public.first().map(|p| p.id), Some(visible.id));

    let err = products
        .update(
            &owner,
            visible.id,
            ProductUpdate {
                price: Some(-1),
                ..ProductUpdate::default()
            },
        )
        .await
        .expect_err("negative price");
    assert!(matches!(err, AppError::BadRequest(_)));
}

// ============================================================================
// Tracking links
// ============================================================================

#[tokio::test]
async fn test_tracking_link_click_counts_and_inactive_links_vanish() {
    let ctx = TestContext::new().await;
    let owner = approved_store(&ctx.pool, "Loja Links", "links@example.com", Plan::Pro).await;
    let links = TrackingLinkService::new(&ctx.pool);

    let link = links
        .create(&owner, link_input("Instagram", "Insta Bio"))
        .await
        .expect("link");
    assert_eq!(link.slug, "insta-bio");

    let err = links
        .create(&owner, link_input("Outro", "insta-bio"))
        .await
        .expect_err("duplicate slug");
    assert!(matches!(err, AppError::Conflict(_)));

    let mut bad = link_input("Ruim", "ruim");
    bad.target_url = "javascript:alert(1)".to_string();
    let err = links.create(&owner, bad).await.expect_err("bad url");
    assert!(matches!(err, AppError::BadRequest(_)));

    for _ in 0..2 {
        let target = links
            .click(owner.store_id, "insta-bio")
            .await
            .expect("click");
        assert_eq!(target, "https://example.com/promo");
    }
    let listed = links.list(&owner).await.expect("list");
    assert_eq!(listed.first().map(|l| l.clicks), Some(2));

    links
        .update(
            &owner,
            link.id,
            TrackingLinkUpdate {
                status: Some(ActivationStatus::Inactive),
                ..TrackingLinkUpdate::default()
            },
        )
        .await
        .expect("deactivate");
    let err = links
        .click(owner.store_id, "insta-bio")
        .await
        .expect_err("inactive link");
    assert!(matches!(err, AppError::NotFound(_)));
}

// ============================================================================
// Affiliates
// ============================================================================

#[tokio::test]
async fn test_affiliate_codes_and_public_lookup() {
    let ctx = TestContext::new().await;
    let owner = approved_store(&ctx.pool, "Loja Top", "top@example.com", Plan::Platinum).await;
    let affiliates = AffiliateService::new(&ctx.pool);

    let err = affiliates
        .create(&owner, affiliate_input("p@example.com", 101))
        .await
        .expect_err("commission above 100");
    assert!(matches!(err, AppError::BadRequest(_)));

    let first = affiliates
        .create(&owner, affiliate_input("p1@example.com", 10))
        .await
        .expect("affiliate");
    let second = affiliates
        .create(&owner, affiliate_input("p2@example.com", 10))
        .await
        .expect("affiliate");
    assert_ne!(first.affiliate_code, second.affiliate_code);

    let public = affiliates
        .get_public_by_code(&first.affiliate_code)
        .await
        .expect("public affiliate");
    assert_eq!(public.store_id, owner.store_id);

    assert!(affiliates.track_click(&first.affiliate_code).await.expect("click"));
    assert!(!affiliates.track_click("NOPE-0000").await.expect("click"));

    let toggled = affiliates
        .toggle_status(&owner, first.id)
        .await
        .expect("toggle");
    assert!(!toggled.status.is_active());
    assert_eq!(toggled.total_clicks, 1);

    let err = affiliates
        .get_public_by_code(&first.affiliate_code)
        .await
        .expect_err("inactive affiliate");
    assert!(matches!(err, AppError::NotFound(_)));

    let billing = affiliates.billing(&owner).await.expect("billing");
    assert_eq!(billing.active, 1);
    assert_eq!(billing.extra_fee, 0);
}

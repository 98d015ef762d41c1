//! Store lifecycle: registration, approval, login, rejection and deletion.

use vitrine_core::{CouponType, Plan, StoreStatus};
use vitrine_integration_tests::{
    TEST_PASSWORD, TestContext, approved_store, coupon_input, order_input, product_input,
    register_store,
};
use vitrine_server::db::StoreCredentialRepository;
use vitrine_server::error::AppError;
use vitrine_server::services::{
    AffiliateInput, AffiliateService, CouponService, OrderService, ProductService,
    StoreAuthService, StoreService,
};

async fn count_rows(pool: &sqlx::SqlitePool, table: &str, store_id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM {table} WHERE store_id = $1"
    ))
    .bind(store_id)
    .fetch_one(pool)
    .await
    .expect("Failed to count rows")
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_registration_starts_pending_with_unique_slugs() {
    let ctx = TestContext::new().await;
    let service = StoreService::new(&ctx.pool);

    let first = register_store(&ctx.pool, "Loja da Ana", "ana@example.com", Plan::Basic).await;
    let second = register_store(&ctx.pool, "Loja da Ana", "ana2@example.com", Plan::Pro).await;

    let first = service.get(first).await.expect("first store");
    let second = service.get(second).await.expect("second store");

    assert_eq!(first.status, StoreStatus::Pending);
    assert_eq!(first.slug, "loja-da-ana");
    assert_ne!(first.slug, second.slug);
    assert!(second.slug.starts_with("loja-da-ana"));
    assert!(first.user_id.is_none());
    assert!(first.plain_password.is_none());
    assert_ne!(first.access_code, second.access_code);
}

#[tokio::test]
async fn test_pending_store_is_not_public() {
    let ctx = TestContext::new().await;
    register_store(&ctx.pool, "Loja Oculta", "oculta@example.com", Plan::Basic).await;

    let err = StoreService::new(&ctx.pool)
        .get_public_by_slug("loja-oculta")
        .await
        .expect_err("pending store must be hidden");
    assert!(matches!(err, AppError::NotFound(_)));
}

// ============================================================================
// Approval and login
// ============================================================================

#[tokio::test]
async fn test_login_before_approval_is_forbidden() {
    let ctx = TestContext::new().await;
    register_store(&ctx.pool, "Loja Nova", "nova@example.com", Plan::Basic).await;

    let err = StoreAuthService::new(&ctx.pool)
        .login("nova@example.com", TEST_PASSWORD)
        .await
        .expect_err("pending store must not log in");
    assert!(matches!(err, AppError::Forbidden(_)), "got {err:?}");
}

#[tokio::test]
async fn test_approve_then_login_returns_the_store() {
    let ctx = TestContext::new().await;
    let store_id = register_store(&ctx.pool, "Loja Aprovada", "dona@example.com", Plan::Pro).await;

    let store = StoreService::new(&ctx.pool)
        .approve(store_id, TEST_PASSWORD)
        .await
        .expect("approve");
    assert_eq!(store.status, StoreStatus::Approved);
    assert_eq!(store.plain_password.as_deref(), Some(TEST_PASSWORD));

    let login = StoreAuthService::new(&ctx.pool)
        .login("DONA@example.com", TEST_PASSWORD)
        .await
        .expect("login after approval");
    assert_eq!(login.store_id, store_id);

    let err = StoreAuthService::new(&ctx.pool)
        .login("dona@example.com", "senha-errada")
        .await
        .expect_err("wrong password");
    assert!(matches!(err, AppError::Auth(_)));
}

#[tokio::test]
async fn test_second_approval_conflicts_and_keeps_credential() {
    let ctx = TestContext::new().await;
    let store_id = register_store(&ctx.pool, "Loja Dupla", "dupla@example.com", Plan::Basic).await;
    let service = StoreService::new(&ctx.pool);

    service.approve(store_id, TEST_PASSWORD).await.expect("approve");
    let credentials = StoreCredentialRepository::new(&ctx.pool);
    let (before, hash_before) = credentials
        .get_by_store(store_id)
        .await
        .expect("query")
        .expect("credential");

    let err = service
        .approve(store_id, "outra-senha-forte")
        .await
        .expect_err("second approval");
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");

    let (after, hash_after) = credentials
        .get_by_store(store_id)
        .await
        .expect("query")
        .expect("credential");
    assert_eq!(before.id, after.id);
    assert_eq!(hash_before, hash_after);

    StoreAuthService::new(&ctx.pool)
        .login("dupla@example.com", TEST_PASSWORD)
        .await
        .expect("original password still works");
}

#[tokio::test]
async fn test_approve_rejects_weak_password_and_unknown_store() {
    let ctx = TestContext::new().await;
    let store_id = register_store(&ctx.pool, "Loja Fraca", "fraca@example.com", Plan::Basic).await;
    let service = StoreService::new(&ctx.pool);

    let err = service.approve(store_id, "123").await.expect_err("weak");
    assert!(matches!(err, AppError::Auth(_)));

    let err = service
        .approve(vitrine_core::StoreId::new(9_999), TEST_PASSWORD)
        .await
        .expect_err("unknown store");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_password_change_clears_escrow() {
    let ctx = TestContext::new().await;
    let owner = approved_store(&ctx.pool, "Loja Senha", "senha@example.com", Plan::Basic).await;
    let auth = StoreAuthService::new(&ctx.pool);

    let err = auth
        .update_password(&owner, "errada-demais", "nova-senha-forte")
        .await
        .expect_err("wrong current password");
    assert!(matches!(err, AppError::BadRequest(_)));

    auth.update_password(&owner, TEST_PASSWORD, "nova-senha-forte")
        .await
        .expect("password change");

    let store = StoreService::new(&ctx.pool)
        .get(owner.store_id)
        .await
        .expect("store");
    assert!(store.plain_password.is_none());
    auth.login("senha@example.com", "nova-senha-forte")
        .await
        .expect("login with new password");
}

// ============================================================================
// Rejection and deletion
// ============================================================================

#[tokio::test]
async fn test_rejected_store_login_reports_reason() {
    let ctx = TestContext::new().await;
    let owner = approved_store(&ctx.pool, "Loja Vetada", "vetada@example.com", Plan::Basic).await;

    let err = StoreService::new(&ctx.pool)
        .reject(owner.store_id, "   ")
        .await
        .expect_err("blank reason");
    assert!(matches!(err, AppError::BadRequest(_)));

    StoreService::new(&ctx.pool)
        .reject(owner.store_id, "documentos pendentes")
        .await
        .expect("reject");

    let err = StoreAuthService::new(&ctx.pool)
        .login("vetada@example.com", TEST_PASSWORD)
        .await
        .expect_err("rejected store");
    match err {
        AppError::Forbidden(message) => assert!(message.contains("documentos pendentes")),
        other => panic!("expected Forbidden, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rejected_pending_store_can_be_approved_later() {
    let ctx = TestContext::new().await;
    let store_id =
        register_store(&ctx.pool, "Loja Revista", "revista@example.com", Plan::Basic).await;
    let service = StoreService::new(&ctx.pool);

    let rejected = service
        .reject(store_id, "faltou o CNPJ")
        .await
        .expect("reject pending store");
    assert_eq!(rejected.status, StoreStatus::Rejected);

    let approved = service
        .approve(store_id, TEST_PASSWORD)
        .await
        .expect("a rejected store without credential can be approved");
    assert_eq!(approved.status, StoreStatus::Approved);
    assert!(approved.rejection_reason.is_none());

    let login = StoreAuthService::new(&ctx.pool)
        .login("revista@example.com", TEST_PASSWORD)
        .await
        .expect("login after re-approval");
    assert_eq!(login.store_id, store_id);

    let err = service
        .delete_rejected(store_id)
        .await
        .expect_err("store is approved again");
    assert!(matches!(err, AppError::Forbidden(_)), "got {err:?}");
}

#[tokio::test]
async fn test_delete_rejected_refuses_approved_store() {
    let ctx = TestContext::new().await;
    let owner = approved_store(&ctx.pool, "Loja Viva", "viva@example.com", Plan::Basic).await;
    ProductService::new(&ctx.pool)
        .create(&owner, product_input("Caneca", 3_000))
        .await
        .expect("product");
    let service = StoreService::new(&ctx.pool);

    let err = service
        .delete_rejected(owner.store_id)
        .await
        .expect_err("approved store");
    assert!(matches!(err, AppError::Forbidden(_)));

    let store = service.get(owner.store_id).await.expect("store still exists");
    assert_eq!(store.status, StoreStatus::Approved);

    let raw_id = owner.store_id.as_i64();
    assert_eq!(count_rows(&ctx.pool, "product", raw_id).await, 1);
    assert_eq!(count_rows(&ctx.pool, "store_credential", raw_id).await, 1);

    let err = service
        .delete_rejected(vitrine_core::StoreId::new(9_999))
        .await
        .expect_err("unknown store");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_delete_rejected_removes_everything_the_store_owns() {
    let ctx = TestContext::new().await;
    let owner = approved_store(&ctx.pool, "Loja Cheia", "cheia@example.com", Plan::Platinum).await;
    let store_id = owner.store_id;

    let product = ProductService::new(&ctx.pool)
        .create(&owner, product_input("Camiseta", 5_000))
        .await
        .expect("product");
    CouponService::new(&ctx.pool)
        .create(&owner, coupon_input("BEMVINDO", CouponType::Percentage, 10))
        .await
        .expect("coupon");
    let affiliate = AffiliateService::new(&ctx.pool)
        .create(
            &owner,
            AffiliateInput {
                name: "Parceira".to_string(),
                email: "parceira@example.com".to_string(),
                whatsapp: None,
                commission_percentage: 10,
            },
        )
        .await
        .expect("affiliate");

    let mut order = order_input(store_id, product.id, 5_000, 1);
    order.affiliate_code = Some(affiliate.affiliate_code);
    OrderService::new(&ctx.pool)
        .create(order, chrono::Utc::now())
        .await
        .expect("order");

    let raw_id = store_id.as_i64();
    assert_eq!(count_rows(&ctx.pool, "sale", raw_id).await, 1);

    let service = StoreService::new(&ctx.pool);
    service
        .reject(store_id, "fraude")
        .await
        .expect("approved stores can still be rejected");
    service.delete_rejected(store_id).await.expect("delete");

    for table in [
        "product",
        "store_order",
        "coupon",
        "affiliate",
        "sale",
        "store_credential",
    ] {
        assert_eq!(count_rows(&ctx.pool, table, raw_id).await, 0, "{table}");
    }
    let err = service.get(store_id).await.expect_err("store is gone");
    assert!(matches!(err, AppError::NotFound(_)));
}

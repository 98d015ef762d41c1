//! Session resolution and the role gate.

use vitrine_core::Plan;
use vitrine_integration_tests::{
    TEST_PASSWORD, TestContext, approved_store, product_input, seed_admin,
};
use vitrine_server::config::AdminAllowlist;
use vitrine_server::error::AppError;
use vitrine_server::services::{
    AdminAuthService, Principal, ProductService, RoleGate, SessionKind, SessionValidator,
    StoreAuthService,
};

#[tokio::test]
async fn test_missing_or_unknown_token_is_anonymous() {
    let ctx = TestContext::new().await;
    let sessions = SessionValidator::new(&ctx.pool);

    assert_eq!(
        sessions.resolve(None, SessionKind::StoreOwner).await,
        Principal::AnonymousBuyer
    );
    assert_eq!(
        sessions.resolve(Some(""), SessionKind::Admin).await,
        Principal::AnonymousBuyer
    );
    assert_eq!(
        sessions
            .resolve(Some("not-a-real-token"), SessionKind::StoreOwner)
            .await,
        Principal::AnonymousBuyer
    );
}

#[tokio::test]
async fn test_tokens_do_not_cross_tiers() {
    let ctx = TestContext::new().await;
    seed_admin(&ctx.pool, "admin@example.com").await;
    let (_, admin_token) = AdminAuthService::new(&ctx.pool)
        .login("admin@example.com", TEST_PASSWORD)
        .await
        .expect("admin login");

    let sessions = SessionValidator::new(&ctx.pool);
    assert!(matches!(
        sessions.resolve(Some(&admin_token), SessionKind::Admin).await,
        Principal::PlatformAdmin(_)
    ));
    assert_eq!(
        sessions
            .resolve(Some(&admin_token), SessionKind::StoreOwner)
            .await,
        Principal::AnonymousBuyer
    );
}

#[tokio::test]
async fn test_store_token_is_forbidden_on_another_store() {
    let ctx = TestContext::new().await;
    let store_a = approved_store(&ctx.pool, "Loja A", "a@example.com", Plan::Pro).await;
    let store_b = approved_store(&ctx.pool, "Loja B", "b@example.com", Plan::Pro).await;

    let token_a = StoreAuthService::new(&ctx.pool)
        .login("a@example.com", TEST_PASSWORD)
        .await
        .expect("login")
        .token;

    let allowlist = AdminAllowlist::default();
    let gate = RoleGate::new(&ctx.pool, &allowlist);

    let owner = gate
        .require_store_owner(Some(&token_a), store_a.store_id)
        .await
        .expect("own store");
    assert_eq!(owner.store_id, store_a.store_id);

    let err = gate
        .require_store_owner(Some(&token_a), store_b.store_id)
        .await
        .expect_err("other store");
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = gate
        .require_store_owner(None, store_a.store_id)
        .await
        .expect_err("no session");
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn test_entities_of_another_store_are_forbidden() {
    let ctx = TestContext::new().await;
    let store_a = approved_store(&ctx.pool, "Loja A", "a@example.com", Plan::Basic).await;
    let store_b = approved_store(&ctx.pool, "Loja B", "b@example.com", Plan::Basic).await;
    let products = ProductService::new(&ctx.pool);

    let product = products
        .create(&store_b, product_input("Caneca", 3_000))
        .await
        .expect("product");

    let err = products
        .get(&store_a, product.id)
        .await
        .expect_err("foreign product");
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = products
        .delete(&store_a, product.id)
        .await
        .expect_err("foreign delete");
    assert!(matches!(err, AppError::Forbidden(_)));
    products
        .get(&store_b, product.id)
        .await
        .expect("product untouched");
}

#[tokio::test]
async fn test_admin_allowlist() {
    let ctx = TestContext::new().await;
    seed_admin(&ctx.pool, "boss@example.com").await;
    seed_admin(&ctx.pool, "helper@example.com").await;
    let auth = AdminAuthService::new(&ctx.pool);
    let (_, boss_token) = auth
        .login("boss@example.com", TEST_PASSWORD)
        .await
        .expect("login");
    let (_, helper_token) = auth
        .login("helper@example.com", TEST_PASSWORD)
        .await
        .expect("login");

    let allowlist = AdminAllowlist::parse("boss@example.com").expect("allowlist");
    let gate = RoleGate::new(&ctx.pool, &allowlist);

    gate.require_admin(Some(&boss_token))
        .await
        .expect("allowlisted admin");
    let err = gate
        .require_admin(Some(&helper_token))
        .await
        .expect_err("not allowlisted");
    assert!(matches!(err, AppError::Forbidden(_)));

    let open = AdminAllowlist::default();
    RoleGate::new(&ctx.pool, &open)
        .require_admin(Some(&helper_token))
        .await
        .expect("empty allowlist admits every admin");
}

#[tokio::test]
async fn test_logout_invalidates_store_session() {
    let ctx = TestContext::new().await;
    approved_store(&ctx.pool, "Loja Sair", "sair@example.com", Plan::Basic).await;
    let auth = StoreAuthService::new(&ctx.pool);

    let token = auth
        .login("sair@example.com", TEST_PASSWORD)
        .await
        .expect("login")
        .token;
    let sessions = SessionValidator::new(&ctx.pool);
    assert!(sessions.store_owner(Some(&token)).await.is_some());

    auth.logout(&token).await.expect("logout");
    assert!(sessions.store_owner(Some(&token)).await.is_none());
}

#[tokio::test]
async fn test_admin_cannot_delete_self() {
    let ctx = TestContext::new().await;
    let admin = seed_admin(&ctx.pool, "solo@example.com").await;
    let other = seed_admin(&ctx.pool, "other@example.com").await;
    let auth = AdminAuthService::new(&ctx.pool);

    let err = auth
        .delete_admin(admin.id, admin.id)
        .await
        .expect_err("self delete");
    assert!(matches!(err, AppError::BadRequest(_)));

    auth.delete_admin(admin.id, other.id).await.expect("delete other");
    assert_eq!(auth.list_admins().await.expect("list").len(), 1);

    let err = auth
        .create_admin("solo@example.com", TEST_PASSWORD, None)
        .await
        .expect_err("duplicate email");
    assert!(matches!(err, AppError::Auth(_)));
}

//! The router end to end: cookies, role checks and response views.

use axum::http::{StatusCode, header};
use serde_json::json;

use vitrine_integration_tests::{
    TEST_PASSWORD, TestContext, expect_status, read_json, seed_admin, send_json,
    session_cookie_pair,
};

async fn admin_cookie(ctx: &TestContext) -> String {
    seed_admin(&ctx.pool, "admin@example.com").await;
    let app = ctx.router();
    let response = send_json(
        &app,
        "POST",
        "/api/admin/auth/login",
        None,
        Some(&json!({ "email": "admin@example.com", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    session_cookie_pair(&response)
}

/// Register through the public endpoint and approve as admin. Returns the id.
async fn register_and_approve(ctx: &TestContext, admin: &str, email: &str, plan: &str) -> i64 {
    let app = ctx.router();
    let response = send_json(
        &app,
        "POST",
        "/api/public/stores/register",
        None,
        Some(&json!({
            "name": "Loja HTTP",
            "ownerEmail": email,
            "ownerName": "Dona",
            "ownerWhatsapp": "5511999990000",
            "whatsapp": "5511999990001",
            "plan": plan,
        })),
    )
    .await;
    let body = expect_status(response, StatusCode::CREATED).await;
    assert_eq!(body["status"], "pending");
    let id = body["id"].as_i64().expect("store id");

    let response = send_json(
        &app,
        "POST",
        &format!("/api/admin/stores/{id}/approve"),
        Some(admin),
        Some(&json!({ "password": TEST_PASSWORD })),
    )
    .await;
    expect_status(response, StatusCode::OK).await;
    id
}

async fn store_cookie(ctx: &TestContext, email: &str) -> String {
    let response = send_json(
        &ctx.router(),
        "POST",
        "/api/store-auth/login",
        None,
        Some(&json!({ "email": email, "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    session_cookie_pair(&response)
}

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new().await;
    let app = ctx.router();

    let response = send_json(&app, "GET", "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let response = send_json(&app, "GET", "/health/ready", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_login_sets_http_only_cookie() {
    let ctx = TestContext::new().await;
    seed_admin(&ctx.pool, "admin@example.com").await;
    let app = ctx.router();

    let response = send_json(
        &app,
        "POST",
        "/api/admin/auth/login",
        None,
        Some(&json!({ "email": "admin@example.com", "password": "senha-errada" })),
    )
    .await;
    let body = expect_status(response, StatusCode::UNAUTHORIZED).await;
    assert_eq!(body["error"], "unauthenticated");

    let response = send_json(
        &app,
        "POST",
        "/api/admin/auth/login",
        None,
        Some(&json!({ "email": "admin@example.com", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("Set-Cookie")
        .to_string();
    assert!(set_cookie.starts_with("admin_session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(!set_cookie.contains("Secure"));
    let cookie = session_cookie_pair(&response);

    let me = read_json(send_json(&app, "GET", "/api/admin/auth/me", Some(&cookie), None).await).await;
    assert_eq!(me["email"], "admin@example.com");

    let anonymous = read_json(send_json(&app, "GET", "/api/admin/auth/me", None, None).await).await;
    assert!(anonymous.is_null());
}

#[tokio::test]
async fn test_store_cookie_authorizes_only_its_store() {
    let ctx = TestContext::new().await;
    let admin = admin_cookie(&ctx).await;
    let store_a = register_and_approve(&ctx, &admin, "a@example.com", "basic").await;
    let store_b = register_and_approve(&ctx, &admin, "b@example.com", "basic").await;
    let cookie = store_cookie(&ctx, "a@example.com").await;
    let app = ctx.router();

    let response = send_json(
        &app,
        "POST",
        &format!("/api/stores/{store_a}/products"),
        Some(&cookie),
        Some(&json!({ "name": "Camiseta", "price": 4_990 })),
    )
    .await;
    let product = expect_status(response, StatusCode::CREATED).await;
    assert_eq!(product["storeId"], store_a);

    let response = send_json(
        &app,
        "GET",
        &format!("/api/stores/{store_a}/products"),
        None,
        None,
    )
    .await;
    expect_status(response, StatusCode::UNAUTHORIZED).await;

    let response = send_json(
        &app,
        "GET",
        &format!("/api/stores/{store_b}/products"),
        Some(&cookie),
        None,
    )
    .await;
    expect_status(response, StatusCode::FORBIDDEN).await;

    let response = send_json(
        &app,
        "POST",
        &format!("/api/stores/{store_a}/coupons"),
        Some(&cookie),
        Some(&json!({
            "code": "DEZ",
            "type": "percentage",
            "value": 10,
            "validFrom": "2020-01-01T00:00:00Z",
            "validUntil": "2099-01-01T00:00:00Z",
        })),
    )
    .await;
    let body = expect_status(response, StatusCode::FORBIDDEN).await;
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_store_logout_invalidates_token() {
    let ctx = TestContext::new().await;
    let admin = admin_cookie(&ctx).await;
    let store_id = register_and_approve(&ctx, &admin, "dona@example.com", "pro").await;
    let cookie = store_cookie(&ctx, "dona@example.com").await;
    let app = ctx.router();

    let me = read_json(send_json(&app, "GET", "/api/store-auth/me", Some(&cookie), None).await).await;
    assert_eq!(me["storeId"], store_id);

    let response = send_json(&app, "POST", "/api/store-auth/logout", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cleared.contains("Max-Age=0"));

    let response = send_json(
        &app,
        "GET",
        &format!("/api/stores/{store_id}/orders"),
        Some(&cookie),
        None,
    )
    .await;
    expect_status(response, StatusCode::UNAUTHORIZED).await;

    let me = read_json(send_json(&app, "GET", "/api/store-auth/me", Some(&cookie), None).await).await;
    assert!(me.is_null());
}

#[tokio::test]
async fn test_plain_password_only_in_admin_views() {
    let ctx = TestContext::new().await;
    let admin = admin_cookie(&ctx).await;
    let store_id = register_and_approve(&ctx, &admin, "dona@example.com", "pro").await;
    let app = ctx.router();

    let admin_view = expect_status(
        send_json(
            &app,
            "GET",
            &format!("/api/admin/stores/{store_id}"),
            Some(&admin),
            None,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(admin_view["plainPassword"], TEST_PASSWORD);

    let slug = admin_view["slug"].as_str().expect("slug").to_string();
    let public_view = expect_status(
        send_json(&app, "GET", &format!("/api/public/stores/{slug}"), None, None).await,
        StatusCode::OK,
    )
    .await;
    assert!(public_view.get("plainPassword").is_none());
    assert!(public_view.get("accessCode").is_none());

    let store_cookie = store_cookie(&ctx, "dona@example.com").await;
    let owner_view = read_json(
        send_json(&app, "GET", "/api/store-auth/me", Some(&store_cookie), None).await,
    )
    .await;
    assert!(owner_view.get("plainPassword").is_none());

    let response = send_json(&app, "GET", "/api/admin/stores", Some(&store_cookie), None).await;
    expect_status(response, StatusCode::UNAUTHORIZED).await;
}

#[tokio::test]
async fn test_public_checkout_flow() {
    let ctx = TestContext::new().await;
    let admin = admin_cookie(&ctx).await;
    let store_id = register_and_approve(&ctx, &admin, "dona@example.com", "pro").await;
    let cookie = store_cookie(&ctx, "dona@example.com").await;
    let app = ctx.router();

    let product = expect_status(
        send_json(
            &app,
            "POST",
            &format!("/api/stores/{store_id}/products"),
            Some(&cookie),
            Some(&json!({ "name": "Caneca", "price": 3_000 })),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    expect_status(
        send_json(
            &app,
            "POST",
            &format!("/api/stores/{store_id}/coupons"),
            Some(&cookie),
            Some(&json!({
                "code": "dez",
                "type": "percentage",
                "value": 10,
                "validFrom": "2020-01-01T00:00:00Z",
                "validUntil": "2099-01-01T00:00:00Z",
            })),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;

    let listed = expect_status(
        send_json(
            &app,
            "GET",
            &format!("/api/public/stores/{store_id}/products"),
            None,
            None,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let validation = expect_status(
        send_json(
            &app,
            "POST",
            "/api/public/coupons/validate",
            None,
            Some(&json!({ "storeId": store_id, "code": "DEZ", "purchaseAmount": 6_000 })),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(validation["discountAmount"], 600);

    let order = expect_status(
        send_json(
            &app,
            "POST",
            "/api/public/orders",
            None,
            Some(&json!({
                "storeId": store_id,
                "customerName": "Cliente",
                "customerPhone": "5511988887777",
                "items": [{
                    "productId": product["id"],
                    "productName": "Caneca",
                    "quantity": 2,
                    "price": 3_000,
                    "total": 6_000,
                }],
                "subtotal": 6_000,
                "discount": 600,
                "shipping": 1_500,
                "total": 6_900,
                "couponCode": "DEZ",
            })),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let order_id = order["id"].as_i64().expect("order id");

    let response = send_json(
        &app,
        "POST",
        &format!("/api/orders/{order_id}/status"),
        Some(&cookie),
        Some(&json!({ "status": "confirmed" })),
    )
    .await;
    let updated = expect_status(response, StatusCode::OK).await;
    assert_eq!(updated["status"], "confirmed");
}

#[tokio::test]
async fn test_delete_rejected_over_http() {
    let ctx = TestContext::new().await;
    let admin = admin_cookie(&ctx).await;
    let store_id = register_and_approve(&ctx, &admin, "dona@example.com", "basic").await;
    let app = ctx.router();

    let response = send_json(
        &app,
        "DELETE",
        &format!("/api/admin/stores/{store_id}"),
        Some(&admin),
        None,
    )
    .await;
    expect_status(response, StatusCode::FORBIDDEN).await;

    let response = send_json(
        &app,
        "POST",
        &format!("/api/admin/stores/{store_id}/reject"),
        Some(&admin),
        Some(&json!({ "reason": "dados incompletos" })),
    )
    .await;
    let rejected = expect_status(response, StatusCode::OK).await;
    assert_eq!(rejected["status"], "rejected");

    let response = send_json(
        &app,
        "DELETE",
        &format!("/api/admin/stores/{store_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_platform_panel_stores() {
    let ctx = TestContext::new().await;
    let admin = admin_cookie(&ctx).await;
    let app = ctx.router();

    let created = expect_status(
        send_json(
            &app,
            "POST",
            "/api/stores",
            Some(&admin),
            Some(&json!({
                "name": "Loja Painel",
                "slug": "Loja Painel!",
                "ownerEmail": "painel@example.com",
                "ownerName": "Painel",
                "ownerWhatsapp": "5511999990000",
                "whatsapp": "5511999990001",
                "primaryColor": "#112233",
            })),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    assert!(created["accessCode"].as_str().is_some_and(|c| !c.is_empty()));
    let id = created["id"].as_i64().expect("id");

    let listed = expect_status(
        send_json(&app, "GET", "/api/stores", Some(&admin), None).await,
        StatusCode::OK,
    )
    .await;
    let first = listed.get(0).expect("one store");
    assert_eq!(first["slug"], "loja-painel");
    assert!(first.get("plainPassword").is_none());

    let response = send_json(
        &app,
        "PATCH",
        &format!("/api/stores/{id}"),
        Some(&admin),
        Some(&json!({ "primaryColor": "blue" })),
    )
    .await;
    expect_status(response, StatusCode::BAD_REQUEST).await;

    let response = send_json(&app, "GET", "/api/stores", None, None).await;
    expect_status(response, StatusCode::UNAUTHORIZED).await;
}

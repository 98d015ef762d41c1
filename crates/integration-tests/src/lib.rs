//! Integration tests for Vitrine.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p vitrine-integration-tests
//! ```
//!
//! Every test gets its own migrated in-memory `SQLite` database, so tests
//! need no external services and can run in parallel.
//!
//! # Test Categories
//!
//! - `store_lifecycle` - Registration, approval, rejection and deletion
//! - `authorization` - Session resolution and the role gate
//! - `catalog` - Plan entitlements on products and marketing tools
//! - `checkout` - Coupons, order totals, status transitions, attribution
//! - `http_api` - The router end to end: cookies, views, errors

#![allow(clippy::missing_panics_doc)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use chrono::{Duration, Utc};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;
use url::Url;

use vitrine_core::{Cents, CouponType, Plan, ProductId, StoreId};
use vitrine_server::config::ServerConfig;
use vitrine_server::db;
use vitrine_server::models::{AdminUser, OrderItem};
use vitrine_server::services::{
    AdminAuthService, CouponInput, OrderInput, ProductInput, SessionValidator, StoreAuthService,
    StoreOwner, StoreRegistration, StoreService,
};
use vitrine_server::state::AppState;

/// Password used for every seeded admin and approved store.
pub const TEST_PASSWORD: &str = "segredo-forte";

/// A fresh database plus the application state around it.
pub struct TestContext {
    pub pool: SqlitePool,
    pub state: AppState,
}

impl TestContext {
    pub async fn new() -> Self {
        let pool = db::create_in_memory_pool()
            .await
            .expect("Failed to create test database");
        let base_url = Url::parse("http://localhost:3000").expect("Invalid base URL");
        let config = ServerConfig::for_database("sqlite::memory:", base_url);
        let state = AppState::new(config, pool.clone());
        Self { pool, state }
    }

    /// The full router, middleware included.
    pub fn router(&self) -> Router {
        vitrine_server::app(self.state.clone())
    }
}

/// Create a platform admin with [`TEST_PASSWORD`].
pub async fn seed_admin(pool: &SqlitePool, email: &str) -> AdminUser {
    AdminAuthService::new(pool)
        .create_admin(email, TEST_PASSWORD, Some("Admin"))
        .await
        .expect("Failed to seed admin")
}

/// Self-register a pending store.
pub async fn register_store(pool: &SqlitePool, name: &str, owner_email: &str, plan: Plan) -> StoreId {
    StoreService::new(pool)
        .register(StoreRegistration {
            name: name.to_string(),
            owner_email: owner_email.to_string(),
            owner_name: "Dona da Loja".to_string(),
            owner_whatsapp: "5511999990000".to_string(),
            whatsapp: "5511999990001".to_string(),
            plan,
        })
        .await
        .expect("Failed to register store")
        .id
}

/// Register and approve a store, then log its owner in.
pub async fn approved_store(
    pool: &SqlitePool,
    name: &str,
    owner_email: &str,
    plan: Plan,
) -> StoreOwner {
    let store_id = register_store(pool, name, owner_email, plan).await;
    StoreService::new(pool)
        .approve(store_id, TEST_PASSWORD)
        .await
        .expect("Failed to approve store");

    let login = StoreAuthService::new(pool)
        .login(owner_email, TEST_PASSWORD)
        .await
        .expect("Failed to log store owner in");

    SessionValidator::new(pool)
        .store_owner(Some(&login.token))
        .await
        .expect("Fresh store session did not resolve")
}

pub fn product_input(name: &str, price: Cents) -> ProductInput {
    ProductInput {
        name: name.to_string(),
        description: None,
        price,
        category: None,
        images: Vec::new(),
        video_url: None,
        stock: Some(10),
        featured: false,
        available_for_affiliates: false,
    }
}

/// A coupon valid from yesterday until next week.
pub fn coupon_input(code: &str, kind: CouponType, value: i64) -> CouponInput {
    let now = Utc::now();
    CouponInput {
        code: code.to_string(),
        kind,
        value,
        min_purchase: 0,
        max_uses: 0,
        valid_from: now - Duration::days(1),
        valid_until: now + Duration::days(7),
    }
}

/// A one-line order whose totals add up.
pub fn order_input(
    store_id: StoreId,
    product_id: ProductId,
    price: Cents,
    quantity: i64,
) -> OrderInput {
    let subtotal = price * quantity;
    OrderInput {
        store_id,
        customer_name: "Cliente".to_string(),
        customer_email: Some("cliente@example.com".to_string()),
        customer_phone: "5511988887777".to_string(),
        customer_address: None,
        items: vec![OrderItem {
            product_id,
            product_name: "Produto".to_string(),
            quantity,
            price,
            total: subtotal,
        }],
        subtotal,
        discount: 0,
        shipping: 0,
        total: subtotal,
        payment_method: Some("pix".to_string()),
        shipping_method: None,
        notes: None,
        coupon_code: None,
        affiliate_code: None,
        tracking_link: None,
        source: None,
    }
}

/// Send a JSON request through the router.
pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<&Value>,
) -> Response<Body> {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    app.clone()
        .oneshot(request.body(body).expect("Failed to build request"))
        .await
        .expect("Router failed")
}

/// Read a response body as JSON. An empty body reads as `null`.
pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

/// The `name=value` pair of the first `Set-Cookie` header, for replay.
pub fn session_cookie_pair(response: &Response<Body>) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("No Set-Cookie header")
        .to_str()
        .expect("Set-Cookie is not ASCII");
    set_cookie
        .split(';')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Assert a status code and return the JSON body.
pub async fn expect_status(response: Response<Body>, status: StatusCode) -> Value {
    let actual = response.status();
    let body = read_json(response).await;
    assert_eq!(actual, status, "unexpected status, body: {body}");
    body
}

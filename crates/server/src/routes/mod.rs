//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                   - Liveness
//! GET  /health/ready                             - Database ping
//!
//! # Platform admin
//! POST   /api/admin/auth/login                   - Log in, sets admin_session
//! POST   /api/admin/auth/logout                  - Log out
//! GET    /api/admin/auth/me                      - Current admin or null
//! GET    /api/admin/admins                       - List admins
//! POST   /api/admin/admins                       - Create admin
//! DELETE /api/admin/admins/{id}                  - Delete admin
//! GET    /api/admin/stores                       - Every store, with escrowed passwords
//! GET    /api/admin/stores/{id}                  - One store
//! POST   /api/admin/stores/{id}/approve          - Approve and issue credential
//! POST   /api/admin/stores/{id}/reject           - Reject with reason
//! DELETE /api/admin/stores/{id}                  - Delete a rejected store
//!
//! # Store owner
//! POST   /api/store-auth/login                   - Log in, sets store_session
//! POST   /api/store-auth/logout                  - Log out
//! GET    /api/store-auth/me                      - Current owner or null
//! POST   /api/store-auth/password                - Change password
//! POST   /api/stores/{id}/products               - Create product
//! GET    /api/stores/{id}/products               - List products
//! GET    /api/products/{id}                      - Get product
//! PATCH  /api/products/{id}                      - Update product
//! DELETE /api/products/{id}                      - Delete product
//! GET    /api/stores/{id}/orders                 - List orders
//! GET    /api/orders/{id}                        - Get order
//! POST   /api/orders/{id}/status                 - Change order status
//! POST   /api/stores/{id}/coupons                - Create coupon
//! GET    /api/stores/{id}/coupons                - List coupons
//! PATCH  /api/coupons/{id}                       - Update coupon
//! DELETE /api/coupons/{id}                       - Delete coupon
//! POST   /api/stores/{id}/tracking-links         - Create tracking link
//! GET    /api/stores/{id}/tracking-links         - List tracking links
//! PATCH  /api/tracking-links/{id}                - Update tracking link
//! DELETE /api/tracking-links/{id}                - Delete tracking link
//! POST   /api/stores/{id}/affiliates             - Enroll affiliate
//! GET    /api/stores/{id}/affiliates             - List affiliates
//! GET    /api/stores/{id}/affiliates/billing     - Affiliate overage report
//! PATCH  /api/affiliates/{id}                    - Update affiliate
//! POST   /api/affiliates/{id}/toggle             - Toggle affiliate status
//! DELETE /api/affiliates/{id}                    - Delete affiliate
//! GET    /api/stores/{id}/sales                  - Sales of the store
//! GET    /api/affiliates/{id}/sales              - Sales of one affiliate
//!
//! # Platform panel (platform user mirrored from the admin session)
//! POST   /api/stores                             - Create store
//! GET    /api/stores                             - Own stores
//! GET    /api/stores/{id}                        - Own store
//! PATCH  /api/stores/{id}                        - Update store profile
//! DELETE /api/stores/{id}                        - Delete store and its data
//!
//! # Public
//! POST   /api/public/stores/register             - Self-registration
//! GET    /api/public/stores/{slug}               - Approved store by slug
//! GET    /api/public/stores/{id}/products        - Active products
//! POST   /api/public/orders                      - Checkout
//! POST   /api/public/coupons/validate            - Check a coupon
//! POST   /api/public/tracking-links/click        - Count a click
//! GET    /api/public/affiliates/{code}           - Affiliate by code
//! POST   /api/public/affiliates/{code}/click     - Count a referral click
//! ```

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub mod admin_auth;
pub mod admin_stores;
pub mod affiliates;
pub mod coupons;
pub mod health;
pub mod orders;
pub mod products;
pub mod store_auth;
pub mod stores;
pub mod tracking_links;

/// Build the API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Platform admin
        .route("/api/admin/auth/login", post(admin_auth::login))
        .route("/api/admin/auth/logout", post(admin_auth::logout))
        .route("/api/admin/auth/me", get(admin_auth::me))
        .route(
            "/api/admin/admins",
            get(admin_auth::list_admins).post(admin_auth::create_admin),
        )
        .route(
            "/api/admin/admins/{id}",
            axum::routing::delete(admin_auth::delete_admin),
        )
        .route("/api/admin/stores", get(admin_stores::list_all))
        .route(
            "/api/admin/stores/{id}",
            get(admin_stores::get).delete(admin_stores::delete_rejected),
        )
        .route("/api/admin/stores/{id}/approve", post(admin_stores::approve))
        .route("/api/admin/stores/{id}/reject", post(admin_stores::reject))
        // Store owner
        .route("/api/store-auth/login", post(store_auth::login))
        .route("/api/store-auth/logout", post(store_auth::logout))
        .route("/api/store-auth/me", get(store_auth::me))
        .route("/api/store-auth/password", post(store_auth::update_password))
        .route(
            "/api/stores/{id}/products",
            get(products::list).post(products::create),
        )
        .route(
            "/api/products/{id}",
            get(products::get)
                .patch(products::update)
                .delete(products::delete),
        )
        .route("/api/stores/{id}/orders", get(orders::list))
        .route("/api/orders/{id}", get(orders::get))
        .route("/api/orders/{id}/status", post(orders::update_status))
        .route(
            "/api/stores/{id}/coupons",
            get(coupons::list).post(coupons::create),
        )
        .route(
            "/api/coupons/{id}",
            axum::routing::patch(coupons::update).delete(coupons::delete),
        )
        .route(
            "/api/stores/{id}/tracking-links",
            get(tracking_links::list).post(tracking_links::create),
        )
        .route(
            "/api/tracking-links/{id}",
            axum::routing::patch(tracking_links::update).delete(tracking_links::delete),
        )
        .route(
            "/api/stores/{id}/affiliates",
            get(affiliates::list).post(affiliates::create),
        )
        .route("/api/stores/{id}/affiliates/billing", get(affiliates::billing))
        .route(
            "/api/affiliates/{id}",
            axum::routing::patch(affiliates::update).delete(affiliates::delete),
        )
        .route("/api/affiliates/{id}/toggle", post(affiliates::toggle_status))
        .route("/api/stores/{id}/sales", get(affiliates::list_sales))
        .route(
            "/api/affiliates/{id}/sales",
            get(affiliates::list_sales_by_affiliate),
        )
        // Platform panel
        .route("/api/stores", get(stores::list).post(stores::create))
        .route(
            "/api/stores/{id}",
            get(stores::get).patch(stores::update).delete(stores::delete),
        )
        // Public. The slug and id routes share one parameter name so the
        // router accepts both.
        .route("/api/public/stores/register", post(stores::register))
        .route("/api/public/stores/{store}", get(stores::get_by_slug))
        .route(
            "/api/public/stores/{store}/products",
            get(products::list_public),
        )
        .route("/api/public/orders", post(orders::create))
        .route("/api/public/coupons/validate", post(coupons::validate))
        .route(
            "/api/public/tracking-links/click",
            post(tracking_links::click),
        )
        .route("/api/public/affiliates/{code}", get(affiliates::get_by_code))
        .route(
            "/api/public/affiliates/{code}/click",
            post(affiliates::track_click),
        )
}

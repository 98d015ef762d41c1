//! HTTP middleware and extractors.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (the `http_request` span)
//! 3. Request ID (recorded on the span, echoed in the response)
//!
//! Authentication is not a layer: handlers opt in through the extractors in
//! [`auth`], which read the cookies defined in [`cookies`].

pub mod auth;
pub mod cookies;
pub mod request_id;

pub use auth::{
    AdminSession, LegacyUser, OptionalAdminSession, OptionalStoreSession, SessionCookies,
    StoreOwnerSession,
};
pub use cookies::{
    ADMIN_SESSION_COOKIE, STORE_SESSION_COOKIE, clear_cookie, read_cookie, session_cookie,
};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};

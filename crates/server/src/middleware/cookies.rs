//! Session cookies.
//!
//! Both tiers use an opaque token in an `HttpOnly` cookie. The cookie only
//! carries the token; the session itself lives in the credential row.

use axum::http::{HeaderMap, header::COOKIE};
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};

/// Cookie carrying a platform admin session token.
pub const ADMIN_SESSION_COOKIE: &str = "admin_session";

/// Cookie carrying a store owner session token.
pub const STORE_SESSION_COOKIE: &str = "store_session";

/// Session cookie lifetime in days.
const SESSION_DAYS: i64 = 30;

/// Build a `Set-Cookie` value that stores `token` under `name`.
#[must_use]
pub fn session_cookie(name: &'static str, token: String, secure: bool) -> String {
    Cookie::build((name, token))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::days(SESSION_DAYS))
        .build()
        .to_string()
}

/// Build a `Set-Cookie` value that removes the cookie `name`.
#[must_use]
pub fn clear_cookie(name: &'static str, secure: bool) -> String {
    Cookie::build((name, ""))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::ZERO)
        .build()
        .to_string()
}

/// Read the value of cookie `name` from the request headers.
#[must_use]
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie(STORE_SESSION_COOKIE, "abc".to_string(), true);
        assert!(cookie.starts_with("store_session=abc"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=2592000"));

        let insecure = session_cookie(ADMIN_SESSION_COOKIE, "abc".to_string(), false);
        assert!(!insecure.contains("Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_cookie(ADMIN_SESSION_COOKIE, false);
        assert!(cookie.starts_with("admin_session="));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_read_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; store_session=tok123; admin_session="),
        );

        assert_eq!(
            read_cookie(&headers, STORE_SESSION_COOKIE),
            Some("tok123".to_string())
        );
        assert_eq!(read_cookie(&headers, ADMIN_SESSION_COOKIE), None);
        assert_eq!(read_cookie(&headers, "missing"), None);
    }
}

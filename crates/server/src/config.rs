//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `VITRINE_DATABASE_URL` - `SQLite` connection string (falls back to `DATABASE_URL`)
//! - `VITRINE_BASE_URL` - Public URL of the platform; `https://` marks cookies `Secure`
//!
//! ## Optional
//! - `VITRINE_HOST` - Bind address (default: 127.0.0.1)
//! - `VITRINE_PORT` - Listen port (default: 3000)
//! - `VITRINE_ADMIN_EMAILS` - Comma-separated admins allowed to run platform
//!   operations (default: every authenticated admin)
//! - `VITRINE_AUTO_MIGRATE` - Apply migrations on startup (default: false)
//! - `LOG_FORMAT` - `json` for structured logs (default: text)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use vitrine_core::Email;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Admin emails allowed to perform platform-admin operations.
///
/// An empty allowlist permits every authenticated admin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminAllowlist {
    emails: Vec<Email>,
}

impl AdminAllowlist {
    /// Build an allowlist from already-parsed emails.
    #[must_use]
    pub const fn new(emails: Vec<Email>) -> Self {
        Self { emails }
    }

    /// Parse a comma-separated list, ignoring blank entries.
    ///
    /// # Errors
    ///
    /// Returns the offending entry if it is not a valid email.
    pub fn parse(value: &str) -> Result<Self, String> {
        let emails = value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| Email::parse(entry).map_err(|e| format!("{entry}: {e}")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { emails })
    }

    /// Whether `email` may perform platform-admin operations.
    #[must_use]
    pub fn permits(&self, email: &Email) -> bool {
        self.emails.is_empty() || self.emails.contains(email)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// `SQLite` database URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the platform
    pub base_url: Url,
    /// Admins allowed to perform platform operations
    pub admin_allowlist: AdminAllowlist,
    /// Apply embedded migrations on startup
    pub auto_migrate: bool,
    /// Emit JSON logs instead of text
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("database_url", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_url", &self.base_url.as_str())
            .field("admin_allowlist", &self.admin_allowlist)
            .field("auto_migrate", &self.auto_migrate)
            .field("json_logs", &self.json_logs)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish_non_exhaustive()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("VITRINE_DATABASE_URL")?;
        let host = get_env_or_default("VITRINE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("VITRINE_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("VITRINE_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("VITRINE_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("VITRINE_BASE_URL")?;
        let base_url = Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("VITRINE_BASE_URL".to_string(), e.to_string())
        })?;
        let admin_allowlist = AdminAllowlist::parse(&get_env_or_default("VITRINE_ADMIN_EMAILS", ""))
            .map_err(|e| ConfigError::InvalidEnvVar("VITRINE_ADMIN_EMAILS".to_string(), e))?;
        let auto_migrate = parse_bool(&get_env_or_default("VITRINE_AUTO_MIGRATE", "false"));
        let json_logs = get_env_or_default("LOG_FORMAT", "text").eq_ignore_ascii_case("json");
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            admin_allowlist,
            auto_migrate,
            json_logs,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Configuration for tests and embedded use: no Sentry, text logs.
    #[must_use]
    pub fn for_database(database_url: &str, base_url: Url) -> Self {
        Self {
            database_url: SecretString::from(database_url),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url,
            admin_allowlist: AdminAllowlist::default(),
            auto_migrate: false,
            json_logs: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies must carry the `Secure` attribute.
    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> ServerConfig {
        ServerConfig::for_database("sqlite::memory:", Url::parse(base_url).unwrap())
    }

    #[test]
    fn test_socket_addr() {
        let addr = config("http://localhost:3000").socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_cookie_secure_follows_scheme() {
        assert!(!config("http://localhost:3000").cookie_secure());
        assert!(config("https://vitrine.example.com").cookie_secure());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = config("https://vitrine.example.com");
        config.database_url = SecretString::from("sqlite:///var/lib/secret-path.db");
        config.sentry_dsn = Some("https://key@sentry.example.com/1".to_string());

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("secret-path"));
        assert!(!debug_output.contains("key@sentry"));
    }

    #[test]
    fn test_allowlist_parsing() {
        let list = AdminAllowlist::parse(" Ana@Example.com, ,bo@example.com ").unwrap();
        assert!(list.permits(&Email::parse("ana@example.com").unwrap()));
        assert!(list.permits(&Email::parse("bo@example.com").unwrap()));
        assert!(!list.permits(&Email::parse("eve@example.com").unwrap()));

        assert!(AdminAllowlist::parse("not-an-email").is_err());
    }

    #[test]
    fn test_empty_allowlist_permits_everyone() {
        let list = AdminAllowlist::parse("").unwrap();
        assert!(list.is_empty());
        assert!(list.permits(&Email::parse("anyone@example.com").unwrap()));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool(" YES "));
        assert!(parse_bool("1"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool(""));
    }
}

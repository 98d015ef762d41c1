//! Database operations for the platform `SQLite` database.
//!
//! ## Tables
//!
//! - `admin_user` - Platform administrators and their session tokens
//! - `platform_user` - Legacy platform identity mirrored from admin sessions
//! - `store` - Tenants, their lifecycle status and the escrowed password
//! - `store_credential` - One owner login per approved store
//! - `product`, `store_order` - Catalog and orders
//! - `coupon`, `tracking_link`, `affiliate`, `sale` - Marketing
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and embedded in the
//! binary. Run them via:
//! ```bash
//! cargo run -p vitrine-cli -- migrate
//! ```

pub mod admin_users;
pub mod affiliates;
pub mod coupons;
pub mod orders;
pub mod platform_users;
pub mod products;
pub mod sales;
pub mod store_credentials;
pub mod stores;
pub mod tracking_links;

use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::SqlitePool;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;

pub use admin_users::AdminUserRepository;
pub use affiliates::{AffiliateRepository, NewAffiliate};
pub use coupons::{CouponRepository, NewCoupon};
pub use orders::{DUPLICATE_ORDER_NUMBER, NewOrder, OrderRepository};
pub use platform_users::PlatformUserRepository;
pub use products::{NewProduct, ProductRepository};
pub use sales::{NewSale, SaleRepository};
pub use store_credentials::StoreCredentialRepository;
pub use stores::{NewStore, StoreProfileUpdate, StoreRepository};
pub use tracking_links::{NewTrackingLink, TrackingLinkRepository};

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique slug).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Maps a unique violation to `Conflict(message)` and anything else to
    /// `Database`.
    pub(crate) fn from_unique(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_string());
        }
        Self::Database(err)
    }
}

/// Create a `SQLite` connection pool with sensible defaults.
///
/// The database file is created if missing and foreign keys are enforced on
/// every connection.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection cannot be
/// established.
pub async fn create_pool(database_url: &SecretString) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Create a migrated in-memory database.
///
/// Uses a single connection that never expires, since every `SQLite`
/// in-memory connection is its own database.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection or a migration fails.
pub async fn create_in_memory_pool() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await.map_err(sqlx::Error::from)?;
    Ok(pool)
}

/// Apply all pending embedded migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the history is inconsistent.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

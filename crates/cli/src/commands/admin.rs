//! Platform admin bootstrap.
//!
//! # Usage
//!
//! ```bash
//! vitrine admin create -e admin@example.com -n "Admin Name" --password '...'
//! ```
//!
//! The password may come from `VITRINE_ADMIN_PASSWORD` instead of the flag,
//! which keeps it out of shell history.

use vitrine_server::services::AdminAuthService;

use super::{CommandError, connect};

/// Create a platform admin and return its id.
///
/// # Errors
///
/// Returns `CommandError::Rejected` for an invalid email, a weak password or
/// an email that is already taken.
pub async fn create_admin(email: &str, name: &str, password: &str) -> Result<i64, CommandError> {
    let pool = connect().await?;

    tracing::info!("Creating admin: {}", email);
    let admin = AdminAuthService::new(&pool)
        .create_admin(email, password, Some(name))
        .await
        .map_err(|e| CommandError::Rejected(e.to_string()))?;

    tracing::info!(
        "Admin created successfully! ID: {}, Email: {}",
        admin.id,
        admin.email
    );
    Ok(admin.id.as_i64())
}

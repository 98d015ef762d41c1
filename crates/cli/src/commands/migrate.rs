//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! vitrine migrate
//! ```
//!
//! # Environment Variables
//!
//! - `VITRINE_DATABASE_URL` - `SQLite` connection string (falls back to `DATABASE_URL`)
//!
//! The migrations are embedded in the server crate, so the CLI always
//! applies the schema the server binary was built against.

use super::{CommandError, connect};

/// Apply all pending migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    vitrine_server::db::run_migrations(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}

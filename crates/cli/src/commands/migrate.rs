//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! comptoir-cli migrate
//! ```
//!
//! Migrations live in `crates/admin/migrations/` and are embedded at build
//! time.

use super::{CommandError, connect};

/// Run all pending migrations against `DATABASE_URL`.
///
/// # Errors
///
/// Returns an error if the connection fails or a migration cannot be applied.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../admin/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}

//! Database migration command.
//!
//! Migrations live in `crates/server/migrations/` and are embedded at build
//! time.

use super::{CliError, connect};

/// Run every pending migration.
///
/// # Errors
///
/// Returns an error if the connection or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}

//! Maintenance jobs meant for cron.

use vitrinex_server::db::MessageRepository;

use super::{CliError, connect};

/// Recompute every unread counter from the message table.
///
/// # Errors
///
/// Returns an error if the connection or the update fails.
pub async fn recount_unread() -> Result<(), CliError> {
    let pool = connect().await?;

    let changed = MessageRepository::new(&pool).recount_unread().await?;
    tracing::info!(changed, "Unread counters recomputed");
    Ok(())
}

/// Delete messages older than `days` on closed threads.
///
/// # Errors
///
/// Returns an error if `days` is zero or the delete fails.
pub async fn purge_messages(days: u16) -> Result<(), CliError> {
    if days == 0 {
        return Err(CliError::Invalid("--days must be at least 1".into()));
    }
    let pool = connect().await?;

    let deleted = MessageRepository::new(&pool)
        .purge_closed_older_than(i32::from(days))
        .await?;
    tracing::info!(deleted, days, "Old messages purged");
    Ok(())
}

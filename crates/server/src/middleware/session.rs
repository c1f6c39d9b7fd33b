//! Owner sessions stored in `PostgreSQL` via tower-sessions.

use sqlx::PgPool;
use tower_sessions::cookie::{SameSite, time::Duration};
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::VitrinexConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "vx_session";

/// Idle owners are logged out after 7 days.
const SESSION_IDLE_DAYS: i64 = 7;

/// Build the session layer. The `tower_sessions.session` table comes from the
/// initial migration.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &VitrinexConfig,
) -> SessionManagerLayer<PostgresStore> {
    let same_site = if config.cross_site_cookies() {
        SameSite::None
    } else {
        SameSite::Lax
    };

    SessionManagerLayer::new(PostgresStore::new(pool.clone()))
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_IDLE_DAYS)))
        .with_secure(config.is_secure())
        .with_same_site(same_site)
        .with_http_only(true)
        .with_path("/")
}

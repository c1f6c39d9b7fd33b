//! Database operations for `PostgreSQL`.
//!
//! # Schema: `vitrinex`
//!
//! ## Tables
//!
//! - `owner` - Store owner accounts (argon2id password hashes)
//! - `store` - One store per owner, with appearance and weekly schedule as JSONB
//! - `special_day` - Per-date schedule overrides
//! - `product` / `service` - Catalog entries
//! - `booking` - Appointments with unread counters and access tokens
//! - `customer_order` / `order_item` - Orders with denormalized items
//! - `message` - Chat messages attached to a booking or an order
//! - `tower_sessions.session` - Session storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p vitrinex-cli -- migrate
//! ```

pub mod analytics;
pub mod bookings;
pub mod messages;
pub mod orders;
pub mod owners;
pub mod products;
pub mod services;
pub mod stores;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use analytics::AnalyticsRepository;
pub use bookings::BookingRepository;
pub use messages::MessageRepository;
pub use orders::OrderRepository;
pub use owners::OwnerRepository;
pub use products::ProductRepository;
pub use services::ServiceRepository;
pub use stores::StoreRepository;

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
    /// Map a unique violation to `Conflict(message)`, anything else to `Database`.
    pub(crate) fn unique_or_database(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Convert a non-negative database integer into the narrower domain type.
pub(crate) fn narrow<T: TryFrom<i32>>(value: i32, field: &str) -> Result<T, RepositoryError> {
    T::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("{field} out of range: {value}")))
}

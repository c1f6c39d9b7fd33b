//! Read-only aggregate queries for the analytics dashboard.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use sqlx::PgPool;

use vitrinex_core::StoreId;

use super::RepositoryError;
use crate::models::{AnalyticsSnapshot, RankedItem};

/// How many entries the top-N lists hold.
const TOP_N: i64 = 5;

/// Window for "upcoming" bookings.
const UPCOMING_DAYS: u64 = 7;

/// Repository for analytics aggregates.
pub struct AnalyticsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AnalyticsRepository<'a> {
    /// Create a new analytics repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Build the full snapshot for a store. `today` is the store-local date.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn snapshot(
        &self,
        store_id: StoreId,
        today: NaiveDate,
    ) -> Result<AnalyticsSnapshot, RepositoryError> {
        let orders_by_status = self
            .counts_by_status(
                r"
                SELECT status::text, COUNT(*) FROM vitrinex.customer_order
                WHERE store_id = $1 GROUP BY status
                ",
                store_id,
            )
            .await?;
        let bookings_by_status = self
            .counts_by_status(
                r"
                SELECT status::text, COUNT(*) FROM vitrinex.booking
                WHERE store_id = $1 GROUP BY status
                ",
                store_id,
            )
            .await?;

        let (revenue, paid_orders): (Decimal, i64) = sqlx::query_as(
            r"
            SELECT COALESCE(SUM(total), 0), COUNT(*)
            FROM vitrinex.customer_order
            WHERE store_id = $1 AND status <> 'cancelled'
            ",
        )
        .bind(store_id)
        .fetch_one(self.pool)
        .await?;

        let horizon = today
            .checked_add_days(Days::new(UPCOMING_DAYS))
            .unwrap_or(NaiveDate::MAX);
        let upcoming_bookings: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM vitrinex.booking
            WHERE store_id = $1
              AND date >= $2 AND date < $3
              AND status IN ('pending', 'confirmed')
            ",
        )
        .bind(store_id)
        .bind(today)
        .bind(horizon)
        .fetch_one(self.pool)
        .await?;

        let top_products = sqlx::query_as::<_, RankedItem>(
            r"
            SELECT i.name, SUM(i.quantity)::bigint AS count
            FROM vitrinex.order_item i
            JOIN vitrinex.customer_order o ON o.id = i.order_id
            WHERE o.store_id = $1 AND o.status <> 'cancelled'
            GROUP BY i.name
            ORDER BY count DESC, i.name
            LIMIT $2
            ",
        )
        .bind(store_id)
        .bind(TOP_N)
        .fetch_all(self.pool)
        .await?;

        let top_services = sqlx::query_as::<_, RankedItem>(
            r"
            SELECT service_name AS name, COUNT(*) AS count
            FROM vitrinex.booking
            WHERE store_id = $1 AND status <> 'cancelled'
            GROUP BY service_name
            ORDER BY count DESC, service_name
            LIMIT $2
            ",
        )
        .bind(store_id)
        .bind(TOP_N)
        .fetch_all(self.pool)
        .await?;

        let unread_messages: i64 = sqlx::query_scalar(
            r"
            SELECT
                COALESCE((SELECT SUM(unread_for_owner) FROM vitrinex.booking WHERE store_id = $1), 0)
              + COALESCE((SELECT SUM(unread_for_owner) FROM vitrinex.customer_order WHERE store_id = $1), 0)
            ",
        )
        .bind(store_id)
        .fetch_one(self.pool)
        .await?;

        Ok(AnalyticsSnapshot {
            orders_by_status,
            revenue,
            average_order_value: AnalyticsSnapshot::average(revenue, paid_orders),
            bookings_by_status,
            upcoming_bookings,
            top_products,
            top_services,
            unread_messages,
        })
    }

    async fn counts_by_status(
        &self,
        sql: &str,
        store_id: StoreId,
    ) -> Result<BTreeMap<String, i64>, RepositoryError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(sql)
            .bind(store_id)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().collect())
    }
}

//! Business analytics snapshot for the owner dashboard and the chatbot.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

/// A named item with a count, for top-N lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct RankedItem {
    pub name: String,
    pub count: i64,
}

/// Aggregates over one store's orders, bookings and chat.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalyticsSnapshot {
    /// Order count per status name.
    pub orders_by_status: BTreeMap<String, i64>,
    /// Sum of non-cancelled order totals.
    #[serde(with = "rust_decimal::serde::str")]
    pub revenue: Decimal,
    /// Revenue over non-cancelled orders; zero when there are none.
    #[serde(with = "rust_decimal::serde::str")]
    pub average_order_value: Decimal,
    /// Booking count per status name.
    pub bookings_by_status: BTreeMap<String, i64>,
    /// Pending or confirmed bookings in the next seven days, today included.
    pub upcoming_bookings: i64,
    /// Best-selling products by quantity.
    pub top_products: Vec<RankedItem>,
    /// Most-booked services.
    pub top_services: Vec<RankedItem>,
    /// Messages the owner has not read.
    pub unread_messages: i64,
}

impl AnalyticsSnapshot {
    /// Average of `revenue` over `orders`, rounded to cents.
    #[must_use]
    pub fn average(revenue: Decimal, orders: i64) -> Decimal {
        if orders <= 0 {
            return Decimal::ZERO;
        }
        (revenue / Decimal::from(orders)).round_dp(2)
    }

    /// Total orders across every status.
    #[must_use]
    pub fn total_orders(&self) -> i64 {
        self.orders_by_status.values().sum()
    }

    /// Total bookings across every status.
    #[must_use]
    pub fn total_bookings(&self) -> i64 {
        self.bookings_by_status.values().sum()
    }
}

//! Catalog entries: products (for `products` stores) and services (for
//! `bookings` stores).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use vitrinex_core::{ProductId, ServiceId, StoreId};

/// A product sold by a store.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub store_id: StoreId,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    /// `None` means stock is not tracked.
    pub stock: Option<u32>,
    pub image_url: Option<String>,
    pub active: bool,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether `quantity` units can be sold right now.
    #[must_use]
    pub fn can_sell(&self, quantity: u32) -> bool {
        self.active && self.stock.is_none_or(|stock| stock >= quantity)
    }
}

/// A bookable service.
#[derive(Debug, Clone, Serialize)]
pub struct Service {
    pub id: ServiceId,
    pub store_id: StoreId,
    pub name: String,
    pub description: String,
    pub duration_minutes: u16,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: Option<u32>, active: bool) -> Product {
        Product {
            id: ProductId::new(1),
            store_id: StoreId::new(1),
            name: "Tote bag".to_string(),
            description: String::new(),
            price: Decimal::new(1500, 2),
            stock,
            image_url: None,
            active,
            position: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_can_sell_respects_stock_and_active() {
        assert!(product(None, true).can_sell(99));
        assert!(product(Some(3), true).can_sell(3));
        assert!(!product(Some(3), true).can_sell(4));
        assert!(!product(None, false).can_sell(1));
    }

    #[test]
    fn test_price_serializes_as_string() {
        let json = serde_json::to_value(product(None, true)).expect("serialize");
        assert_eq!(json["price"], "15.00");
    }
}

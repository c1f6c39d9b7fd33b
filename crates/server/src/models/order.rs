//! Order model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use vitrinex_core::{
    AccessToken, Email, OrderId, OrderItemId, OrderStatus, Price, ProductId, StoreId,
};

/// An order with its denormalized line items.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub store_id: StoreId,
    pub items: Vec<OrderItem>,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
    pub status: OrderStatus,
    pub customer_name: String,
    pub customer_email: Email,
    pub customer_phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    /// Only returned to the customer at creation.
    #[serde(skip_serializing)]
    pub access_token: AccessToken,
    pub unread_for_owner: i32,
    pub unread_for_customer: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of an order. `product_id` is cleared when the product is deleted.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: Option<ProductId>,
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        Price::line_total(self.unit_price, self.quantity)
    }
}

impl Order {
    /// Sum of the item lines; equals `total` for every stored order.
    #[must_use]
    pub fn items_total(&self) -> Decimal {
        Price::order_total(self.items.iter().map(|i| (i.unit_price, i.quantity)))
    }
}

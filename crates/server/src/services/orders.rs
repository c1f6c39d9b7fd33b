//! Customer order requests.

use std::collections::BTreeMap;

use serde::Deserialize;

use vitrinex_core::ProductId;

use crate::db::orders::NewOrder;
use crate::error::AppError;
use crate::validation::{ADDRESS_MAX, NAME_MAX, NOTES_MAX, Validator, clean_optional};

/// Most distinct lines in one order.
pub const MAX_ORDER_LINES: usize = 50;

/// Largest quantity of a single product.
pub const MAX_QUANTITY: u32 = 99;

/// One requested product line.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of `POST /api/stores/{slug}/orders`. Prices come from the catalog,
/// never from here.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderRequest {
    pub items: Vec<OrderLineRequest>,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Sum quantities of repeated products, ordered by product ID.
#[must_use]
pub fn merge_lines(lines: &[OrderLineRequest]) -> Vec<(ProductId, u32)> {
    let mut merged: BTreeMap<ProductId, u32> = BTreeMap::new();
    for line in lines {
        let entry = merged.entry(line.product_id).or_insert(0);
        *entry = entry.saturating_add(line.quantity);
    }
    merged.into_iter().collect()
}

impl OrderRequest {
    /// Validate the form and merge duplicate lines.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` with every failing field.
    pub fn into_new_order(self) -> Result<NewOrder, AppError> {
        let mut v = Validator::new();

        v.check(
            !self.items.is_empty() && self.items.len() <= MAX_ORDER_LINES,
            format!("items must contain between 1 and {MAX_ORDER_LINES} lines"),
        );
        for (i, line) in self.items.iter().enumerate() {
            v.range(&format!("items[{i}].quantity"), line.quantity, 1, MAX_QUANTITY);
        }
        let lines = merge_lines(&self.items);
        for (product_id, quantity) in &lines {
            v.check(
                *quantity <= MAX_QUANTITY,
                format!("product {product_id} quantity must be at most {MAX_QUANTITY} in total"),
            );
        }

        v.required_text("customer_name", &self.customer_name, NAME_MAX)
            .phone("customer_phone", self.customer_phone.as_deref())
            .optional_text("address", self.address.as_deref(), ADDRESS_MAX)
            .optional_text("notes", self.notes.as_deref(), NOTES_MAX);
        let email = v.email("customer_email", &self.customer_email);
        v.finish()?;

        let Some(customer_email) = email else {
            return Err(AppError::Internal("validated order email missing".into()));
        };

        Ok(NewOrder {
            lines,
            customer_name: self.customer_name.trim().to_string(),
            customer_email,
            customer_phone: clean_optional(self.customer_phone),
            address: clean_optional(self.address),
            notes: clean_optional(self.notes),
        })
    }
}

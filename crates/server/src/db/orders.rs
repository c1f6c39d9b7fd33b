//! Order repository.
//!
//! Order creation locks every product row it touches, checks stock against the
//! locked values, decrements tracked stock and writes the order with prices
//! copied from the products. Client-sent prices never reach this layer.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use vitrinex_core::{
    AccessToken, Email, OrderId, OrderItemId, OrderStatus, Price, ProductId, StoreId,
};

use super::products::ProductRow;
use super::{RepositoryError, narrow};
use crate::models::{Order, OrderItem, Product};

const ORDER_COLUMNS: &str = "id, store_id, total, status, customer_name, customer_email, \
     customer_phone, address, notes, access_token, unread_for_owner, unread_for_customer, \
     created_at, updated_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    store_id: StoreId,
    total: Decimal,
    status: OrderStatus,
    customer_name: String,
    customer_email: String,
    customer_phone: Option<String>,
    address: Option<String>,
    notes: Option<String>,
    access_token: AccessToken,
    unread_for_owner: i32,
    unread_for_customer: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let customer_email = Email::parse(&self.customer_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email on order {}: {e}", self.id))
        })?;

        let order = Order {
            id: self.id,
            store_id: self.store_id,
            items,
            total: self.total,
            status: self.status,
            customer_name: self.customer_name,
            customer_email,
            customer_phone: self.customer_phone,
            address: self.address,
            notes: self.notes,
            access_token: self.access_token,
            unread_for_owner: self.unread_for_owner,
            unread_for_customer: self.unread_for_customer,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };

        if order.items_total() != order.total {
            return Err(RepositoryError::DataCorruption(format!(
                "order {} total {} does not match its items ({})",
                order.id,
                order.total,
                order.items_total()
            )));
        }
        Ok(order)
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: Option<ProductId>,
    name: String,
    unit_price: Decimal,
    quantity: i32,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            product_id: row.product_id,
            name: row.name,
            unit_price: row.unit_price,
            quantity: narrow(row.quantity, "quantity")?,
        })
    }
}

/// A validated order request. Lines are already merged per product.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub lines: Vec<(ProductId, u32)>,
    pub customer_name: String,
    pub customer_email: Email,
    pub customer_phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// Who is addressing an order: the owner of its store, or the customer
/// holding its token.
#[derive(Debug, Clone, Copy)]
pub enum OrderTarget {
    Owner { store_id: StoreId, id: OrderId },
    Customer { id: OrderId, token: AccessToken },
}

/// Repository for orders and their items.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a product is unknown to the store,
    /// inactive, or short on stock.
    pub async fn create(
        &self,
        store_id: StoreId,
        new: &NewOrder,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let ids: Vec<i32> = new.lines.iter().map(|(id, _)| id.as_i32()).collect();
        let products: HashMap<ProductId, Product> = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, store_id, name, description, price, stock, image_url, active,
                   position, created_at, updated_at
            FROM vitrinex.product
            WHERE store_id = $1 AND id = ANY($2)
            ORDER BY id
            FOR UPDATE
            ",
        )
        .bind(store_id)
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|row| Product::try_from(row).map(|p| (p.id, p)))
        .collect::<Result<_, _>>()?;

        let mut priced = Vec::with_capacity(new.lines.len());
        for &(product_id, quantity) in &new.lines {
            let product = products
                .get(&product_id)
                .filter(|p| p.active)
                .ok_or_else(|| {
                    RepositoryError::Conflict(format!("product {product_id} is not available"))
                })?;
            if !product.can_sell(quantity) {
                return Err(RepositoryError::Conflict(format!(
                    "only {} left of {}",
                    product.stock.unwrap_or(0),
                    product.name
                )));
            }
            priced.push((product, quantity));
        }

        for (product, quantity) in &priced {
            if product.stock.is_some() {
                sqlx::query(
                    r"
                    UPDATE vitrinex.product
                    SET stock = stock - $2, updated_at = NOW()
                    WHERE id = $1
                    ",
                )
                .bind(product.id)
                .bind(quantity_param(*quantity)?)
                .execute(&mut *tx)
                .await?;
            }
        }

        let total = Price::order_total(priced.iter().map(|(p, q)| (p.price, *q)));

        let order = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO vitrinex.customer_order
                (store_id, total, customer_name, customer_email, customer_phone, address,
                 notes, access_token)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(store_id)
        .bind(total)
        .bind(&new.customer_name)
        .bind(new.customer_email.as_str())
        .bind(&new.customer_phone)
        .bind(&new.address)
        .bind(&new.notes)
        .bind(AccessToken::generate())
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(priced.len());
        for (product, quantity) in &priced {
            let row = sqlx::query_as::<_, OrderItemRow>(
                r"
                INSERT INTO vitrinex.order_item (order_id, product_id, name, unit_price, quantity)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, order_id, product_id, name, unit_price, quantity
                ",
            )
            .bind(order.id)
            .bind(product.id)
            .bind(&product.name)
            .bind(product.price)
            .bind(quantity_param(*quantity)?)
            .fetch_one(&mut *tx)
            .await?;
            items.push(OrderItem::try_from(row)?);
        }

        tx.commit().await?;
        order.into_order(items)
    }

    /// List a store's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        store_id: StoreId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM vitrinex.customer_order
            WHERE store_id = $1
              AND ($2::vitrinex.order_status IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(store_id)
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        self.attach_items(rows).await
    }

    /// Get an order of a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(
        &self,
        store_id: StoreId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM vitrinex.customer_order WHERE store_id = $1 AND id = $2"
        ))
        .bind(store_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(self.attach_items(row.into_iter().collect()).await?.pop())
    }

    /// Get an order by ID and customer access token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_token(
        &self,
        id: OrderId,
        token: AccessToken,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM vitrinex.customer_order
            WHERE id = $1 AND access_token = $2
            "
        ))
        .bind(id)
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(self.attach_items(row.into_iter().collect()).await?.pop())
    }

    /// Move an order to `next`, enforcing the transition table. Cancelling
    /// returns tracked stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not match.
    /// Returns `RepositoryError::Conflict` if the transition is not allowed.
    pub async fn transition(
        &self,
        target: OrderTarget,
        next: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(OrderId, OrderStatus)> = match target {
            OrderTarget::Owner { store_id, id } => {
                sqlx::query_as(
                    r"
                    SELECT id, status FROM vitrinex.customer_order
                    WHERE store_id = $1 AND id = $2
                    FOR UPDATE
                    ",
                )
                .bind(store_id)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
            }
            OrderTarget::Customer { id, token } => {
                sqlx::query_as(
                    r"
                    SELECT id, status FROM vitrinex.customer_order
                    WHERE id = $1 AND access_token = $2
                    FOR UPDATE
                    ",
                )
                .bind(id)
                .bind(token)
                .fetch_optional(&mut *tx)
                .await?
            }
        };
        let (id, status) = current.ok_or(RepositoryError::NotFound)?;

        if !status.can_transition_to(next) {
            return Err(RepositoryError::Conflict(format!(
                "order cannot move from {status} to {next}"
            )));
        }

        if next == OrderStatus::Cancelled {
            sqlx::query(
                r"
                UPDATE vitrinex.product p
                SET stock = p.stock + i.quantity, updated_at = NOW()
                FROM vitrinex.order_item i
                WHERE i.order_id = $1 AND p.id = i.product_id AND p.stock IS NOT NULL
                ",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE vitrinex.customer_order
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(next)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        self.attach_items(vec![row])
            .await?
            .pop()
            .ok_or(RepositoryError::NotFound)
    }

    async fn attach_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = rows.iter().map(|r| r.id.as_i32()).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, product_id, name, unit_price, quantity
            FROM vitrinex.order_item
            WHERE order_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            let order_id = row.order_id;
            by_order
                .entry(order_id)
                .or_default()
                .push(OrderItem::try_from(row)?);
        }

        rows.into_iter()
            .map(|row| {
                let items = by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect()
    }
}

fn quantity_param(quantity: u32) -> Result<i32, RepositoryError> {
    i32::try_from(quantity)
        .map_err(|_| RepositoryError::Conflict(format!("quantity too large: {quantity}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(total: Decimal) -> OrderRow {
        OrderRow {
            id: OrderId::new(7),
            store_id: StoreId::new(1),
            total,
            status: OrderStatus::Pending,
            customer_name: "María Gómez".to_string(),
            customer_email: "maria@example.com".to_string(),
            customer_phone: None,
            address: None,
            notes: None,
            access_token: AccessToken::generate(),
            unread_for_owner: 0,
            unread_for_customer: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn items() -> Vec<OrderItem> {
        vec![
            OrderItem {
                id: OrderItemId::new(1),
                product_id: Some(ProductId::new(3)),
                name: "Taza".to_string(),
                unit_price: Decimal::new(8550, 2),
                quantity: 2,
            },
            OrderItem {
                id: OrderItemId::new(2),
                product_id: None,
                name: "Café 500g".to_string(),
                unit_price: Decimal::new(21000, 2),
                quantity: 2,
            },
        ]
    }

    #[test]
    fn test_into_order_keeps_matching_total() {
        let order = row(Decimal::new(59100, 2)).into_order(items()).unwrap();
        assert_eq!(order.items_total(), order.total);
        assert_eq!(order.items.len(), 2);
    }

    #[test]
    fn test_into_order_rejects_total_drift() {
        let result = row(Decimal::new(60000, 2)).into_order(items());
        assert!(matches!(result, Err(RepositoryError::DataCorruption(_))));
    }
}

//! Product repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use vitrinex_core::{ProductId, StoreId};

use super::{RepositoryError, narrow};
use crate::models::Product;

#[derive(sqlx::FromRow)]
pub(crate) struct ProductRow {
    pub(crate) id: ProductId,
    store_id: StoreId,
    pub(crate) name: String,
    description: String,
    pub(crate) price: Decimal,
    pub(crate) stock: Option<i32>,
    image_url: Option<String>,
    pub(crate) active: bool,
    position: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            store_id: row.store_id,
            name: row.name,
            description: row.description,
            price: row.price,
            stock: row.stock.map(|s| narrow(s, "stock")).transpose()?,
            image_url: row.image_url,
            active: row.active,
            position: row.position,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Owner-editable product fields.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: Option<u32>,
    pub image_url: Option<String>,
    pub active: bool,
    pub position: i32,
}

/// Convert a stock count for binding.
pub(crate) fn stock_param(stock: Option<u32>) -> Result<Option<i32>, RepositoryError> {
    stock
        .map(|s| {
            i32::try_from(s).map_err(|_| RepositoryError::Conflict(format!("stock too large: {s}")))
        })
        .transpose()
}

/// Repository for products. Every query is scoped to one store.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a store's products in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        store_id: StoreId,
        active_only: bool,
    ) -> Result<Vec<Product>, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, store_id, name, description, price, stock, image_url, active,
                   position, created_at, updated_at
            FROM vitrinex.product
            WHERE store_id = $1 AND (active OR NOT $2)
            ORDER BY position, id
            ",
        )
        .bind(store_id)
        .bind(active_only)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Product::try_from)
        .collect()
    }

    /// Get one product of a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        store_id: StoreId,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, store_id, name, description, price, stock, image_url, active,
                   position, created_at, updated_at
            FROM vitrinex.product
            WHERE store_id = $1 AND id = $2
            ",
        )
        .bind(store_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .map(Product::try_from)
        .transpose()
    }

    /// Add a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        store_id: StoreId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO vitrinex.product
                (store_id, name, description, price, stock, image_url, active, position)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, store_id, name, description, price, stock, image_url, active,
                      position, created_at, updated_at
            ",
        )
        .bind(store_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(stock_param(input.stock)?)
        .bind(&input.image_url)
        .bind(input.active)
        .bind(input.position)
        .fetch_one(self.pool)
        .await?;

        Product::try_from(row)
    }

    /// Replace a product's editable fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is not in this store.
    pub async fn update(
        &self,
        store_id: StoreId,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE vitrinex.product
            SET name = $3, description = $4, price = $5, stock = $6, image_url = $7,
                active = $8, position = $9, updated_at = NOW()
            WHERE store_id = $1 AND id = $2
            RETURNING id, store_id, name, description, price, stock, image_url, active,
                      position, created_at, updated_at
            ",
        )
        .bind(store_id)
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(stock_param(input.stock)?)
        .bind(&input.image_url)
        .bind(input.active)
        .bind(input.position)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Product::try_from(row)
    }

    /// Delete a product. Order items keep their snapshot with a NULL reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is not in this store.
    pub async fn delete(&self, store_id: StoreId, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM vitrinex.product WHERE store_id = $1 AND id = $2")
            .bind(store_id)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

//! Bookable service repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use vitrinex_core::{ServiceId, StoreId};

use super::{RepositoryError, narrow};
use crate::models::Service;

#[derive(sqlx::FromRow)]
struct ServiceRow {
    id: ServiceId,
    store_id: StoreId,
    name: String,
    description: String,
    duration_minutes: i32,
    price: Decimal,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ServiceRow> for Service {
    type Error = RepositoryError;

    fn try_from(row: ServiceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            store_id: row.store_id,
            name: row.name,
            description: row.description,
            duration_minutes: narrow(row.duration_minutes, "duration_minutes")?,
            price: row.price,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Owner-editable service fields.
#[derive(Debug, Clone)]
pub struct ServiceInput {
    pub name: String,
    pub description: String,
    pub duration_minutes: u16,
    pub price: Decimal,
    pub active: bool,
}

/// What happened when an owner asked to delete a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceRemoval {
    Deleted,
    /// Bookings reference it, so it was deactivated instead.
    Deactivated,
}

/// Repository for services. Every query is scoped to one store.
pub struct ServiceRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ServiceRepository<'a> {
    /// Create a new service repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a store's services by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        store_id: StoreId,
        active_only: bool,
    ) -> Result<Vec<Service>, RepositoryError> {
        sqlx::query_as::<_, ServiceRow>(
            r"
            SELECT id, store_id, name, description, duration_minutes, price, active,
                   created_at, updated_at
            FROM vitrinex.service
            WHERE store_id = $1 AND (active OR NOT $2)
            ORDER BY name, id
            ",
        )
        .bind(store_id)
        .bind(active_only)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Service::try_from)
        .collect()
    }

    /// Get one service of a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        store_id: StoreId,
        id: ServiceId,
    ) -> Result<Option<Service>, RepositoryError> {
        sqlx::query_as::<_, ServiceRow>(
            r"
            SELECT id, store_id, name, description, duration_minutes, price, active,
                   created_at, updated_at
            FROM vitrinex.service
            WHERE store_id = $1 AND id = $2
            ",
        )
        .bind(store_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .map(Service::try_from)
        .transpose()
    }

    /// Add a service.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        store_id: StoreId,
        input: &ServiceInput,
    ) -> Result<Service, RepositoryError> {
        let row = sqlx::query_as::<_, ServiceRow>(
            r"
            INSERT INTO vitrinex.service (store_id, name, description, duration_minutes, price, active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, store_id, name, description, duration_minutes, price, active,
                      created_at, updated_at
            ",
        )
        .bind(store_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(i32::from(input.duration_minutes))
        .bind(input.price)
        .bind(input.active)
        .fetch_one(self.pool)
        .await?;

        Service::try_from(row)
    }

    /// Replace a service's editable fields. Existing bookings keep their snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the service is not in this store.
    pub async fn update(
        &self,
        store_id: StoreId,
        id: ServiceId,
        input: &ServiceInput,
    ) -> Result<Service, RepositoryError> {
        let row = sqlx::query_as::<_, ServiceRow>(
            r"
            UPDATE vitrinex.service
            SET name = $3, description = $4, duration_minutes = $5, price = $6,
                active = $7, updated_at = NOW()
            WHERE store_id = $1 AND id = $2
            RETURNING id, store_id, name, description, duration_minutes, price, active,
                      created_at, updated_at
            ",
        )
        .bind(store_id)
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(i32::from(input.duration_minutes))
        .bind(input.price)
        .bind(input.active)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Service::try_from(row)
    }

    /// Delete a service, or deactivate it when bookings reference it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the service is not in this store.
    pub async fn remove(
        &self,
        store_id: StoreId,
        id: ServiceId,
    ) -> Result<ServiceRemoval, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i32> = sqlx::query_scalar(
            "SELECT id FROM vitrinex.service WHERE store_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(store_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let has_bookings: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM vitrinex.booking WHERE service_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let outcome = if has_bookings {
            sqlx::query(
                "UPDATE vitrinex.service SET active = FALSE, updated_at = NOW() WHERE id = $1",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
            ServiceRemoval::Deactivated
        } else {
            sqlx::query("DELETE FROM vitrinex.service WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            ServiceRemoval::Deleted
        };

        tx.commit().await?;
        Ok(outcome)
    }
}

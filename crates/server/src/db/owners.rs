//! Owner repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use vitrinex_core::{Email, OwnerId, Plan};

use super::RepositoryError;
use crate::models::Owner;

#[derive(sqlx::FromRow)]
struct OwnerRow {
    id: OwnerId,
    email: String,
    name: String,
    plan: Plan,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OwnerRow> for Owner {
    type Error = RepositoryError;

    fn try_from(row: OwnerRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            email,
            name: row.name,
            plan: row.plan,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OwnerWithHashRow {
    #[sqlx(flatten)]
    owner: OwnerRow,
    password_hash: String,
}

/// Repository for owner accounts.
pub struct OwnerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OwnerRepository<'a> {
    /// Create a new owner repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an owner by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: OwnerId) -> Result<Option<Owner>, RepositoryError> {
        sqlx::query_as::<_, OwnerRow>(
            r"
            SELECT id, email, name, plan, created_at, updated_at
            FROM vitrinex.owner
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .map(Owner::try_from)
        .transpose()
    }

    /// Get an owner and their password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(Owner, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, OwnerWithHashRow>(
            r"
            SELECT id, email, name, plan, created_at, updated_at, password_hash
            FROM vitrinex.owner
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((Owner::try_from(r.owner)?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// Create a new owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create(
        &self,
        email: &Email,
        name: &str,
        password_hash: &str,
        plan: Plan,
    ) -> Result<Owner, RepositoryError> {
        let row = sqlx::query_as::<_, OwnerRow>(
            r"
            INSERT INTO vitrinex.owner (email, name, password_hash, plan)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, name, plan, created_at, updated_at
            ",
        )
        .bind(email.as_str())
        .bind(name)
        .bind(password_hash)
        .bind(plan)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_or_database(e, "email already exists"))?;

        Owner::try_from(row)
    }

    /// Change an owner's plan.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no owner has this email.
    pub async fn set_plan(&self, email: &Email, plan: Plan) -> Result<Owner, RepositoryError> {
        let row = sqlx::query_as::<_, OwnerRow>(
            r"
            UPDATE vitrinex.owner
            SET plan = $2, updated_at = NOW()
            WHERE email = $1
            RETURNING id, email, name, plan, created_at, updated_at
            ",
        )
        .bind(email.as_str())
        .bind(plan)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Owner::try_from(row)
    }
}

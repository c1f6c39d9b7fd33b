//! Store and special-day repository.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use vitrinex_core::{
    Appearance, CurrencyCode, OwnerId, SpecialDay, StoreId, StoreMode, TimeBlock, WeeklySchedule,
};

use super::{RepositoryError, narrow};
use crate::models::Store;

const STORE_COLUMNS: &str = "id, owner_id, slug, name, description, mode, appearance, \
     schedule_text, weekly_schedule, slot_interval_minutes, utc_offset_minutes, \
     contact_email, contact_phone, currency, created_at, updated_at";

#[derive(sqlx::FromRow)]
pub(crate) struct StoreRow {
    id: StoreId,
    owner_id: OwnerId,
    slug: String,
    name: String,
    description: String,
    mode: StoreMode,
    appearance: serde_json::Value,
    schedule_text: String,
    weekly_schedule: serde_json::Value,
    slot_interval_minutes: i32,
    utc_offset_minutes: i32,
    contact_email: Option<String>,
    contact_phone: Option<String>,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        let appearance = Appearance::from_json(row.appearance)
            .map_err(|e| RepositoryError::DataCorruption(format!("store {}: {e}", row.id)))?;
        let weekly_schedule: WeeklySchedule = serde_json::from_value(row.weekly_schedule)
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("store {} weekly schedule: {e}", row.id))
            })?;
        let currency = row
            .currency
            .parse::<CurrencyCode>()
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        Ok(Self {
            id: row.id,
            owner_id: row.owner_id,
            slug: row.slug,
            name: row.name,
            description: row.description,
            mode: row.mode,
            appearance,
            schedule_text: row.schedule_text,
            weekly_schedule,
            slot_interval_minutes: narrow(row.slot_interval_minutes, "slot_interval_minutes")?,
            utc_offset_minutes: narrow(row.utc_offset_minutes, "utc_offset_minutes")?,
            contact_email: row.contact_email,
            contact_phone: row.contact_phone,
            currency,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct SpecialDayRow {
    date: NaiveDate,
    closed: bool,
    blocks: serde_json::Value,
    note: Option<String>,
}

impl TryFrom<SpecialDayRow> for SpecialDay {
    type Error = RepositoryError;

    fn try_from(row: SpecialDayRow) -> Result<Self, Self::Error> {
        let blocks: Vec<TimeBlock> = serde_json::from_value(row.blocks).map_err(|e| {
            RepositoryError::DataCorruption(format!("special day {} blocks: {e}", row.date))
        })?;
        Ok(Self {
            date: row.date,
            closed: row.closed,
            blocks,
            note: row.note,
        })
    }
}

/// Fields needed to open a store.
#[derive(Debug, Clone)]
pub struct NewStore {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub mode: StoreMode,
    pub currency: CurrencyCode,
}

/// Repository for stores and their special days.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a store by its public slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Store>, RepositoryError> {
        sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM vitrinex.store WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?
        .map(Store::try_from)
        .transpose()
    }

    /// Get the store belonging to an owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_owner(&self, owner_id: OwnerId) -> Result<Option<Store>, RepositoryError> {
        sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM vitrinex.store WHERE owner_id = $1"
        ))
        .bind(owner_id)
        .fetch_optional(self.pool)
        .await?
        .map(Store::try_from)
        .transpose()
    }

    /// Get a store by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM vitrinex.store WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .map(Store::try_from)
        .transpose()
    }

    /// Open a store for an owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the owner already has a store or
    /// the slug is taken.
    pub async fn create(
        &self,
        owner_id: OwnerId,
        new: &NewStore,
    ) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            r"
            INSERT INTO vitrinex.store (owner_id, slug, name, description, mode, currency, appearance)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {STORE_COLUMNS}
            "
        ))
        .bind(owner_id)
        .bind(&new.slug)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.mode)
        .bind(new.currency.code())
        .bind(Json(Appearance::default()))
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                let message = if db_err.constraint() == Some("store_owner_id_key") {
                    "owner already has a store"
                } else {
                    "slug is already taken"
                };
                return RepositoryError::Conflict(message.to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Store::try_from(row)
    }

    /// Write back every owner-editable column of `store`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store no longer exists.
    pub async fn save(&self, store: &Store) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            r"
            UPDATE vitrinex.store
            SET name = $2,
                description = $3,
                mode = $4,
                appearance = $5,
                schedule_text = $6,
                weekly_schedule = $7,
                slot_interval_minutes = $8,
                utc_offset_minutes = $9,
                contact_email = $10,
                contact_phone = $11,
                currency = $12,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {STORE_COLUMNS}
            "
        ))
        .bind(store.id)
        .bind(&store.name)
        .bind(&store.description)
        .bind(store.mode)
        .bind(Json(&store.appearance))
        .bind(&store.schedule_text)
        .bind(Json(&store.weekly_schedule))
        .bind(i32::from(store.slot_interval_minutes))
        .bind(i32::from(store.utc_offset_minutes))
        .bind(&store.contact_email)
        .bind(&store.contact_phone)
        .bind(store.currency.code())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Store::try_from(row)
    }

    /// Replace the appearance document.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store does not exist.
    pub async fn update_appearance(
        &self,
        store_id: StoreId,
        appearance: &Appearance,
    ) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            r"
            UPDATE vitrinex.store
            SET appearance = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {STORE_COLUMNS}
            "
        ))
        .bind(store_id)
        .bind(Json(appearance))
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Store::try_from(row)
    }

    // =========================================================================
    // Special days
    // =========================================================================

    /// List special days from `from` onward, ascending.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_special_days(
        &self,
        store_id: StoreId,
        from: Option<NaiveDate>,
    ) -> Result<Vec<SpecialDay>, RepositoryError> {
        sqlx::query_as::<_, SpecialDayRow>(
            r"
            SELECT date, closed, blocks, note
            FROM vitrinex.special_day
            WHERE store_id = $1 AND ($2::date IS NULL OR date >= $2)
            ORDER BY date
            ",
        )
        .bind(store_id)
        .bind(from)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(SpecialDay::try_from)
        .collect()
    }

    /// Get the special day for a date, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_special_day(
        &self,
        store_id: StoreId,
        date: NaiveDate,
    ) -> Result<Option<SpecialDay>, RepositoryError> {
        sqlx::query_as::<_, SpecialDayRow>(
            r"
            SELECT date, closed, blocks, note
            FROM vitrinex.special_day
            WHERE store_id = $1 AND date = $2
            ",
        )
        .bind(store_id)
        .bind(date)
        .fetch_optional(self.pool)
        .await?
        .map(SpecialDay::try_from)
        .transpose()
    }

    /// Insert or replace the special day for `day.date`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_special_day(
        &self,
        store_id: StoreId,
        day: &SpecialDay,
    ) -> Result<SpecialDay, RepositoryError> {
        let row = sqlx::query_as::<_, SpecialDayRow>(
            r"
            INSERT INTO vitrinex.special_day (store_id, date, closed, blocks, note)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (store_id, date)
            DO UPDATE SET closed = EXCLUDED.closed,
                          blocks = EXCLUDED.blocks,
                          note = EXCLUDED.note
            RETURNING date, closed, blocks, note
            ",
        )
        .bind(store_id)
        .bind(day.date)
        .bind(day.closed)
        .bind(Json(&day.blocks))
        .bind(&day.note)
        .fetch_one(self.pool)
        .await?;

        SpecialDay::try_from(row)
    }

    /// Remove the special day for a date.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there was none.
    pub async fn delete_special_day(
        &self,
        store_id: StoreId,
        date: NaiveDate,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM vitrinex.special_day WHERE store_id = $1 AND date = $2")
                .bind(store_id)
                .bind(date)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

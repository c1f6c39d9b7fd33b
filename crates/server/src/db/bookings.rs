//! Booking repository.
//!
//! Booking creation serializes per store: the store row is locked with
//! `SELECT ... FOR UPDATE`, the store mode and the service are checked again,
//! availability is recomputed from what is committed, and only then is the
//! booking inserted.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{PgConnection, PgPool};

use vitrinex_core::{
    AccessToken, AvailabilityQuery, BookingId, BookingStatus, ClockTime, Email, Reservation,
    ServiceId, SpecialDay, StoreId, StoreMode, WeeklySchedule, is_slot_available,
};

use super::stores::SpecialDayRow;
use super::{RepositoryError, narrow};
use crate::models::Booking;

const BOOKING_COLUMNS: &str = "id, store_id, service_id, service_name, date, slot, \
     duration_minutes, customer_name, customer_email, customer_phone, notes, status, \
     access_token, unread_for_owner, unread_for_customer, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: BookingId,
    store_id: StoreId,
    service_id: ServiceId,
    service_name: String,
    date: NaiveDate,
    slot: ClockTime,
    duration_minutes: i32,
    customer_name: String,
    customer_email: String,
    customer_phone: Option<String>,
    notes: Option<String>,
    status: BookingStatus,
    access_token: AccessToken,
    unread_for_owner: i32,
    unread_for_customer: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = RepositoryError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let customer_email = Email::parse(&row.customer_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email on booking {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            store_id: row.store_id,
            service_id: row.service_id,
            service_name: row.service_name,
            date: row.date,
            slot: row.slot,
            duration_minutes: narrow(row.duration_minutes, "duration_minutes")?,
            customer_name: row.customer_name,
            customer_email,
            customer_phone: row.customer_phone,
            notes: row.notes,
            status: row.status,
            access_token: row.access_token,
            unread_for_owner: row.unread_for_owner,
            unread_for_customer: row.unread_for_customer,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    slot: ClockTime,
    duration_minutes: i32,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = RepositoryError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        Ok(Self::new(row.slot, narrow(row.duration_minutes, "duration_minutes")?))
    }
}

#[derive(sqlx::FromRow)]
struct LockedScheduleRow {
    mode: StoreMode,
    weekly_schedule: serde_json::Value,
    slot_interval_minutes: i32,
}

/// The store still takes bookings and the service is still offered.
///
/// `service_active` is `None` when the service no longer exists.
fn ensure_bookable(mode: StoreMode, service_active: Option<bool>) -> Result<(), RepositoryError> {
    if mode != StoreMode::Bookings {
        return Err(RepositoryError::Conflict("store no longer takes bookings".to_string()));
    }
    if service_active != Some(true) {
        return Err(RepositoryError::Conflict("service is no longer available".to_string()));
    }
    Ok(())
}

/// A validated booking request with the service snapshot already taken.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub service_id: ServiceId,
    pub service_name: String,
    pub duration_minutes: u16,
    pub date: NaiveDate,
    pub slot: ClockTime,
    pub customer_name: String,
    pub customer_email: Email,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

/// Owner-side list filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub date: Option<NaiveDate>,
}

/// Repository for bookings.
pub struct BookingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BookingRepository<'a> {
    /// Create a new booking repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Intervals held by non-cancelled bookings on a date.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn reservations(
        &self,
        store_id: StoreId,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        load_reservations(&mut *conn, store_id, date).await
    }

    /// Insert a booking if its slot is still free.
    ///
    /// `now` is the store-local wall clock used to drop past slots.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slot is not available, or if
    /// the store left bookings mode or the service was deactivated since the
    /// request was checked.
    /// Returns `RepositoryError::NotFound` if the store does not exist.
    pub async fn create_if_available(
        &self,
        store_id: StoreId,
        new: &NewBooking,
        now: NaiveDateTime,
    ) -> Result<Booking, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_as::<_, LockedScheduleRow>(
            r"
            SELECT mode, weekly_schedule, slot_interval_minutes
            FROM vitrinex.store
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(store_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let service_active: Option<bool> = sqlx::query_scalar(
            r"
            SELECT active
            FROM vitrinex.service
            WHERE id = $1 AND store_id = $2
            FOR SHARE
            ",
        )
        .bind(new.service_id)
        .bind(store_id)
        .fetch_optional(&mut *tx)
        .await?;
        ensure_bookable(locked.mode, service_active)?;

        let weekly: WeeklySchedule = serde_json::from_value(locked.weekly_schedule)
            .map_err(|e| RepositoryError::DataCorruption(format!("weekly schedule: {e}")))?;

        let special_day = sqlx::query_as::<_, SpecialDayRow>(
            r"
            SELECT date, closed, blocks, note
            FROM vitrinex.special_day
            WHERE store_id = $1 AND date = $2
            ",
        )
        .bind(store_id)
        .bind(new.date)
        .fetch_optional(&mut *tx)
        .await?
        .map(SpecialDay::try_from)
        .transpose()?;

        let reserved = load_reservations(&mut *tx, store_id, new.date).await?;

        let query = AvailabilityQuery {
            date: new.date,
            duration_minutes: new.duration_minutes,
            slot_interval_minutes: narrow(locked.slot_interval_minutes, "slot_interval_minutes")?,
            weekly: &weekly,
            special_day: special_day.as_ref(),
            reserved: &reserved,
            now,
        };
        if !is_slot_available(&query, new.slot) {
            return Err(RepositoryError::Conflict(format!(
                "slot {} on {} is not available",
                new.slot, new.date
            )));
        }

        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r"
            INSERT INTO vitrinex.booking
                (store_id, service_id, service_name, date, slot, duration_minutes,
                 customer_name, customer_email, customer_phone, notes, access_token)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {BOOKING_COLUMNS}
            "
        ))
        .bind(store_id)
        .bind(new.service_id)
        .bind(&new.service_name)
        .bind(new.date)
        .bind(new.slot)
        .bind(i32::from(new.duration_minutes))
        .bind(&new.customer_name)
        .bind(new.customer_email.as_str())
        .bind(&new.customer_phone)
        .bind(&new.notes)
        .bind(AccessToken::generate())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Booking::try_from(row)
    }

    /// List a store's bookings, soonest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        store_id: StoreId,
        filter: BookingFilter,
    ) -> Result<Vec<Booking>, RepositoryError> {
        sqlx::query_as::<_, BookingRow>(&format!(
            r"
            SELECT {BOOKING_COLUMNS}
            FROM vitrinex.booking
            WHERE store_id = $1
              AND ($2::vitrinex.booking_status IS NULL OR status = $2)
              AND ($3::date IS NULL OR date = $3)
            ORDER BY date, slot, id
            "
        ))
        .bind(store_id)
        .bind(filter.status)
        .bind(filter.date)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Booking::try_from)
        .collect()
    }

    /// Get a booking of a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        store_id: StoreId,
        id: BookingId,
    ) -> Result<Option<Booking>, RepositoryError> {
        sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM vitrinex.booking WHERE store_id = $1 AND id = $2"
        ))
        .bind(store_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .map(Booking::try_from)
        .transpose()
    }

    /// Get a booking by ID and customer access token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_token(
        &self,
        id: BookingId,
        token: AccessToken,
    ) -> Result<Option<Booking>, RepositoryError> {
        sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM vitrinex.booking WHERE id = $1 AND access_token = $2"
        ))
        .bind(id)
        .bind(token)
        .fetch_optional(self.pool)
        .await?
        .map(Booking::try_from)
        .transpose()
    }

    /// Move a booking to `next`, enforcing the transition table.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the booking does not match.
    /// Returns `RepositoryError::Conflict` if the transition is not allowed.
    pub async fn transition(
        &self,
        target: BookingTarget,
        next: BookingStatus,
    ) -> Result<Booking, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(BookingId, BookingStatus)> = match target {
            BookingTarget::Owner { store_id, id } => {
                sqlx::query_as(
                    r"
                    SELECT id, status FROM vitrinex.booking
                    WHERE store_id = $1 AND id = $2
                    FOR UPDATE
                    ",
                )
                .bind(store_id)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
            }
            BookingTarget::Customer { id, token } => {
                sqlx::query_as(
                    r"
                    SELECT id, status FROM vitrinex.booking
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
                "booking cannot move from {status} to {next}"
            )));
        }

        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r"
            UPDATE vitrinex.booking
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {BOOKING_COLUMNS}
            "
        ))
        .bind(id)
        .bind(next)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Booking::try_from(row)
    }
}

/// Who is addressing a booking: the owner of its store, or the customer
/// holding its token.
#[derive(Debug, Clone, Copy)]
pub enum BookingTarget {
    Owner { store_id: StoreId, id: BookingId },
    Customer { id: BookingId, token: AccessToken },
}

async fn load_reservations(
    conn: &mut PgConnection,
    store_id: StoreId,
    date: NaiveDate,
) -> Result<Vec<Reservation>, RepositoryError> {
    sqlx::query_as::<_, ReservationRow>(
        r"
        SELECT slot, duration_minutes
        FROM vitrinex.booking
        WHERE store_id = $1 AND date = $2 AND status <> 'cancelled'
        ",
    )
    .bind(store_id)
    .bind(date)
    .fetch_all(conn)
    .await?
    .into_iter()
    .map(Reservation::try_from)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bookable_store_and_service() {
        assert!(ensure_bookable(StoreMode::Bookings, Some(true)).is_ok());
    }

    #[test]
    fn test_store_switched_to_products() {
        let result = ensure_bookable(StoreMode::Products, Some(true));
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[test]
    fn test_service_deactivated_or_deleted() {
        for active in [Some(false), None] {
            let result = ensure_bookable(StoreMode::Bookings, active);
            assert!(matches!(result, Err(RepositoryError::Conflict(_))), "{active:?}");
        }
    }
}

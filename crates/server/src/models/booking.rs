//! Booking (appointment) model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use vitrinex_core::{
    AccessToken, BookingId, BookingStatus, ClockTime, Email, Reservation, ServiceId, StoreId,
};

/// An appointment. Service name and duration are snapshots taken at creation.
#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub id: BookingId,
    pub store_id: StoreId,
    pub service_id: ServiceId,
    pub service_name: String,
    pub date: NaiveDate,
    pub slot: ClockTime,
    pub duration_minutes: u16,
    pub customer_name: String,
    pub customer_email: Email,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
    pub status: BookingStatus,
    /// Only returned to the customer at creation.
    #[serde(skip_serializing)]
    pub access_token: AccessToken,
    pub unread_for_owner: i32,
    pub unread_for_customer: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// The calendar interval this booking holds.
    #[must_use]
    pub const fn reservation(&self) -> Reservation {
        Reservation::new(self.slot, self.duration_minutes)
    }
}

//! Customer booking requests and slot lookup.

use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;

use vitrinex_core::{AvailabilityQuery, ClockTime, ServiceId, available_slots};

use crate::db::bookings::NewBooking;
use crate::db::{BookingRepository, RepositoryError, StoreRepository};
use crate::error::AppError;
use crate::models::{Service, Store};
use crate::validation::{NAME_MAX, NOTES_MAX, Validator, clean_optional};

/// Body of `POST /api/stores/{slug}/bookings`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookingRequest {
    pub service_id: ServiceId,
    pub date: NaiveDate,
    /// `HH:MM`; parsed during validation so format errors are collected.
    pub slot: String,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl BookingRequest {
    /// Validate the form and snapshot the service.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` with every failing field.
    pub fn into_new_booking(self, service: &Service) -> Result<NewBooking, AppError> {
        let mut v = Validator::new();
        v.required_text("customer_name", &self.customer_name, NAME_MAX)
            .phone("customer_phone", self.customer_phone.as_deref())
            .optional_text("notes", self.notes.as_deref(), NOTES_MAX);
        let email = v.email("customer_email", &self.customer_email);
        let slot = match ClockTime::parse(self.slot.trim()) {
            Ok(slot) => Some(slot),
            Err(e) => {
                v.check(false, format!("slot: {e}"));
                None
            }
        };
        v.finish()?;

        let (Some(customer_email), Some(slot)) = (email, slot) else {
            return Err(AppError::Internal("validated booking fields missing".into()));
        };

        Ok(NewBooking {
            service_id: service.id,
            service_name: service.name.clone(),
            duration_minutes: service.duration_minutes,
            date: self.date,
            slot,
            customer_name: self.customer_name.trim().to_string(),
            customer_email,
            customer_phone: clean_optional(self.customer_phone),
            notes: clean_optional(self.notes),
        })
    }
}

/// Free start times for `service` on `date`, as of the store's local clock.
///
/// # Errors
///
/// Returns `RepositoryError` if loading the calendar fails.
pub async fn open_slots(
    pool: &PgPool,
    store: &Store,
    service: &Service,
    date: NaiveDate,
) -> Result<Vec<ClockTime>, RepositoryError> {
    let special_day = StoreRepository::new(pool)
        .get_special_day(store.id, date)
        .await?;
    let reserved = BookingRepository::new(pool)
        .reservations(store.id, date)
        .await?;

    Ok(available_slots(&AvailabilityQuery {
        date,
        duration_minutes: service.duration_minutes,
        slot_interval_minutes: store.slot_interval_minutes,
        weekly: &store.weekly_schedule,
        special_day: special_day.as_ref(),
        reserved: &reserved,
        now: store.local_now(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use vitrinex_core::StoreId;

    use super::*;

    fn service() -> Service {
        Service {
            id: ServiceId::new(7),
            store_id: StoreId::new(1),
            name: "Corte clásico".to_string(),
            description: String::new(),
            duration_minutes: 45,
            price: Decimal::new(25000, 2),
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request() -> BookingRequest {
        serde_json::from_str(
            r#"{
                "service_id": 7,
                "date": "2026-11-02",
                "slot": "10:30",
                "customer_name": "  Lucía Pérez ",
                "customer_email": "Lucia@Example.com",
                "customer_phone": "+52 55 1234 5678",
                "notes": "  "
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_valid_request_snapshots_service() {
        let booking = request().into_new_booking(&service()).unwrap();
        assert_eq!(booking.service_name, "Corte clásico");
        assert_eq!(booking.duration_minutes, 45);
        assert_eq!(booking.slot.to_string(), "10:30");
        assert_eq!(booking.customer_name, "Lucía Pérez");
        assert_eq!(booking.customer_email.as_str(), "lucia@example.com");
        assert_eq!(booking.notes, None);
    }

    #[test]
    fn test_invalid_request_reports_every_field() {
        let mut req = request();
        req.customer_name = String::new();
        req.customer_email = "nope".to_string();
        req.slot = "25:00".to_string();

        match req.into_new_booking(&service()) {
            Err(AppError::Validation(errors)) => {
                assert_eq!(errors.len(), 3, "{errors:?}");
                assert!(errors.iter().any(|e| e.starts_with("slot")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let json = r#"{"service_id": 1, "date": "2026-11-02", "slot": "10:00",
            "customer_name": "a", "customer_email": "a@b.co", "status": "confirmed"}"#;
        assert!(serde_json::from_str::<BookingRequest>(json).is_err());
    }
}

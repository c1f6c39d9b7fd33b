//! Store (tenant) model.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::Serialize;

use vitrinex_core::{Appearance, CurrencyCode, OwnerId, StoreId, StoreMode, WeeklySchedule};

/// A tenant's store, as the owner sees it.
#[derive(Debug, Clone, Serialize)]
pub struct Store {
    pub id: StoreId,
    pub owner_id: OwnerId,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub mode: StoreMode,
    pub appearance: Appearance,
    /// Free-form hours text shown to customers.
    pub schedule_text: String,
    pub weekly_schedule: WeeklySchedule,
    pub slot_interval_minutes: u16,
    pub utc_offset_minutes: i16,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub currency: CurrencyCode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    /// Store-local wall clock at `now`.
    #[must_use]
    pub fn local_time(&self, now: DateTime<Utc>) -> NaiveDateTime {
        FixedOffset::east_opt(i32::from(self.utc_offset_minutes) * 60).map_or_else(
            || now.naive_utc(),
            |offset| now.with_timezone(&offset).naive_local(),
        )
    }

    /// Store-local wall clock right now.
    #[must_use]
    pub fn local_now(&self) -> NaiveDateTime {
        self.local_time(Utc::now())
    }
}

/// The customer-facing subset of a store. No owner data.
#[derive(Debug, Clone, Serialize)]
pub struct PublicStore {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub mode: StoreMode,
    pub schedule_text: String,
    pub weekly_schedule: WeeklySchedule,
    pub slot_interval_minutes: u16,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub currency: CurrencyCode,
}

impl From<&Store> for PublicStore {
    fn from(store: &Store) -> Self {
        Self {
            slug: store.slug.clone(),
            name: store.name.clone(),
            description: store.description.clone(),
            mode: store.mode,
            schedule_text: store.schedule_text.clone(),
            weekly_schedule: store.weekly_schedule.clone(),
            slot_interval_minutes: store.slot_interval_minutes,
            contact_email: store.contact_email.clone(),
            contact_phone: store.contact_phone.clone(),
            currency: store.currency,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use chrono::TimeZone;

    use super::*;

    pub(crate) fn sample_store() -> Store {
        Store {
            id: StoreId::new(1),
            owner_id: OwnerId::new(1),
            slug: "barberia-sol".to_string(),
            name: "Barbería Sol".to_string(),
            description: String::new(),
            mode: StoreMode::Bookings,
            appearance: Appearance::default(),
            schedule_text: "Lun-Vie 9 a 18".to_string(),
            weekly_schedule: WeeklySchedule::default(),
            slot_interval_minutes: 30,
            utc_offset_minutes: -300,
            contact_email: None,
            contact_phone: Some("+52 55 1234 5678".to_string()),
            currency: CurrencyCode::Mxn,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_local_time_applies_offset() {
        let store = sample_store();
        let now = Utc.with_ymd_and_hms(2026, 10, 26, 3, 30, 0).unwrap();
        // UTC-5: still the previous evening locally.
        assert_eq!(store.local_time(now).to_string(), "2026-10-25 22:30:00");
    }

    #[test]
    fn test_public_store_has_no_owner() {
        let public = PublicStore::from(&sample_store());
        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("owner_id").is_none());
        assert!(json.get("id").is_none());
        assert_eq!(json["slug"], "barberia-sol");
        assert_eq!(json["currency"], "MXN");
    }
}

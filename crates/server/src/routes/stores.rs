//! Store handlers: opening a store, owner settings, public storefront,
//! availability and special days.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use vitrinex_core::{
    ClockTime, CurrencyCode, ServiceId, SpecialDay, StoreMode, TimeBlock, WeeklySchedule,
};

use crate::db::stores::NewStore;
use crate::db::{ServiceRepository, StoreRepository};
use crate::error::{AppError, Result};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::{OwnerStore, RequireOwner};
use crate::models::Store;
use crate::services::bookings::open_slots;
use crate::services::storefront::StorefrontPayload;
use crate::state::AppState;
use crate::validation::{DESCRIPTION_MAX, NAME_MAX, Validator, clean_optional};

const SCHEDULE_TEXT_MAX: usize = 200;

/// Body of `POST /api/stores`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateStoreRequest {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub mode: StoreMode,
    #[serde(default)]
    pub currency: Option<CurrencyCode>,
}

impl CreateStoreRequest {
    /// Validate into repository input. The slug is lowercased first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` with every failing field.
    pub fn into_new_store(self) -> Result<NewStore> {
        let slug = self.slug.trim().to_lowercase();

        let mut v = Validator::new();
        v.slug("slug", &slug)
            .required_text("name", &self.name, NAME_MAX)
            .optional_text("description", self.description.as_deref(), DESCRIPTION_MAX);
        v.finish()?;

        Ok(NewStore {
            slug,
            name: self.name.trim().to_string(),
            description: clean_optional(self.description).unwrap_or_default(),
            mode: self.mode,
            currency: self.currency.unwrap_or_default(),
        })
    }
}

/// Body of `PUT /api/stores/mine`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateStoreRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub mode: Option<StoreMode>,
    pub schedule_text: Option<String>,
    pub weekly_schedule: Option<WeeklySchedule>,
    pub slot_interval_minutes: Option<u16>,
    pub utc_offset_minutes: Option<i16>,
    /// Empty string clears the contact.
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub currency: Option<CurrencyCode>,
}

impl UpdateStoreRequest {
    /// Validate and write the present fields onto `store`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` with every failing field.
    pub fn apply(self, store: &mut Store) -> Result<()> {
        let mut v = Validator::new();

        if let Some(name) = &self.name {
            v.required_text("name", name, NAME_MAX);
        }
        v.optional_text("description", self.description.as_deref(), DESCRIPTION_MAX)
            .optional_text("schedule_text", self.schedule_text.as_deref(), SCHEDULE_TEXT_MAX)
            .phone("contact_phone", self.contact_phone.as_deref());
        if let Some(interval) = self.slot_interval_minutes {
            v.range("slot_interval_minutes", interval, 5, 240);
        }
        if let Some(offset) = self.utc_offset_minutes {
            v.range("utc_offset_minutes", offset, -720, 840);
        }
        if let Some(weekly) = &self.weekly_schedule {
            v.extend(weekly.validate());
        }
        let contact_email = match self.contact_email.as_deref().map(str::trim) {
            Some("") => Some(None),
            Some(raw) => v.email("contact_email", raw).map(|e| Some(e.as_str().to_string())),
            None => None,
        };
        v.finish()?;

        if let Some(name) = self.name {
            store.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            store.description = description.trim().to_string();
        }
        if let Some(mode) = self.mode {
            store.mode = mode;
        }
        if let Some(text) = self.schedule_text {
            store.schedule_text = text.trim().to_string();
        }
        if let Some(weekly) = self.weekly_schedule {
            store.weekly_schedule = weekly;
        }
        if let Some(interval) = self.slot_interval_minutes {
            store.slot_interval_minutes = interval;
        }
        if let Some(offset) = self.utc_offset_minutes {
            store.utc_offset_minutes = offset;
        }
        if let Some(email) = contact_email {
            store.contact_email = email;
        }
        if self.contact_phone.is_some() {
            store.contact_phone = clean_optional(self.contact_phone);
        }
        if let Some(currency) = self.currency {
            store.currency = currency;
        }
        Ok(())
    }
}

/// Open the logged-in owner's store.
#[instrument(skip_all, fields(owner_id = %owner.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireOwner(owner): RequireOwner,
    AppJson(body): AppJson<CreateStoreRequest>,
) -> Result<(StatusCode, AppJson<Store>)> {
    let new = body.into_new_store()?;
    let store = StoreRepository::new(state.pool())
        .create(owner.id, &new)
        .await?;

    tracing::info!(store_id = %store.id, slug = %store.slug, "Store opened");
    Ok((StatusCode::CREATED, AppJson(store)))
}

/// The owner's store with every setting.
pub async fn show_mine(OwnerStore { store, .. }: OwnerStore) -> AppJson<Store> {
    AppJson(store)
}

/// Partially update the owner's store.
#[instrument(skip_all, fields(store_id = %store.id))]
pub async fn update_mine(
    State(state): State<AppState>,
    OwnerStore { mut store, .. }: OwnerStore,
    AppJson(body): AppJson<UpdateStoreRequest>,
) -> Result<AppJson<Store>> {
    body.apply(&mut store)?;
    let saved = StoreRepository::new(state.pool()).save(&store).await?;
    state.storefronts().invalidate(&saved.slug).await;
    Ok(AppJson(saved))
}

/// Public storefront: store, appearance and active catalog.
#[instrument(skip(state))]
pub async fn show_public(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
) -> Result<AppJson<Arc<StorefrontPayload>>> {
    state
        .storefronts()
        .get_or_load(state.pool(), &slug)
        .await?
        .map(AppJson)
        .ok_or_else(|| AppError::NotFound("Store not found".into()))
}

/// `GET /api/stores/{slug}/availability` query.
#[derive(Debug, Deserialize)]
pub struct AvailabilityParams {
    pub service_id: ServiceId,
    pub date: NaiveDate,
}

/// Open slots for one service on one day.
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub date: NaiveDate,
    pub slots: Vec<ClockTime>,
}

/// Bookable start times for an active service.
#[instrument(skip(state))]
pub async fn availability(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
    AppQuery(params): AppQuery<AvailabilityParams>,
) -> Result<AppJson<AvailabilityResponse>> {
    let store = StoreRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Store not found".into()))?;
    if store.mode != StoreMode::Bookings {
        return Err(AppError::BadRequest("This store does not take bookings".into()));
    }

    let service = ServiceRepository::new(state.pool())
        .get(store.id, params.service_id)
        .await?
        .filter(|s| s.active)
        .ok_or_else(|| AppError::NotFound("Service not found".into()))?;

    let slots = open_slots(state.pool(), &store, &service, params.date).await?;
    Ok(AppJson(AvailabilityResponse {
        date: params.date,
        slots,
    }))
}

// =============================================================================
// Special days
// =============================================================================

/// `GET /api/stores/mine/special-days` query.
#[derive(Debug, Deserialize)]
pub struct SpecialDayParams {
    pub from: Option<NaiveDate>,
}

/// Body of `PUT /api/stores/mine/special-days/{date}`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecialDayRequest {
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub blocks: Vec<TimeBlock>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Schedule overrides, ascending by date.
pub async fn list_special_days(
    State(state): State<AppState>,
    OwnerStore { store, .. }: OwnerStore,
    AppQuery(params): AppQuery<SpecialDayParams>,
) -> Result<AppJson<Vec<SpecialDay>>> {
    let days = StoreRepository::new(state.pool())
        .list_special_days(store.id, params.from)
        .await?;
    Ok(AppJson(days))
}

/// Set the override for one date.
#[instrument(skip(state, store, body), fields(store_id = %store.id))]
pub async fn put_special_day(
    State(state): State<AppState>,
    OwnerStore { store, .. }: OwnerStore,
    AppPath(date): AppPath<NaiveDate>,
    AppJson(body): AppJson<SpecialDayRequest>,
) -> Result<AppJson<SpecialDay>> {
    let day = SpecialDay {
        date,
        closed: body.closed,
        blocks: body.blocks,
        note: clean_optional(body.note),
    };
    let errors = day.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let saved = StoreRepository::new(state.pool())
        .upsert_special_day(store.id, &day)
        .await?;
    Ok(AppJson(saved))
}

/// Remove the override for one date.
pub async fn delete_special_day(
    State(state): State<AppState>,
    OwnerStore { store, .. }: OwnerStore,
    AppPath(date): AppPath<NaiveDate>,
) -> Result<StatusCode> {
    StoreRepository::new(state.pool())
        .delete_special_day(store.id, date)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::store::tests::sample_store;

    fn validation_errors(result: Result<()>) -> Vec<String> {
        match result {
            Err(AppError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_apply_only_touches_present_fields() {
        let mut store = sample_store();
        let body = UpdateStoreRequest {
            name: Some("  Barbería Luna ".to_string()),
            slot_interval_minutes: Some(15),
            ..UpdateStoreRequest::default()
        };
        body.apply(&mut store).unwrap();

        assert_eq!(store.name, "Barbería Luna");
        assert_eq!(store.slot_interval_minutes, 15);
        assert_eq!(store.schedule_text, "Lun-Vie 9 a 18");
        assert_eq!(store.contact_phone.as_deref(), Some("+52 55 1234 5678"));
    }

    #[test]
    fn test_apply_clears_contacts_with_empty_strings() {
        let mut store = sample_store();
        store.contact_email = Some("hola@sol.mx".to_string());
        let body = UpdateStoreRequest {
            contact_email: Some(String::new()),
            contact_phone: Some("  ".to_string()),
            ..UpdateStoreRequest::default()
        };
        body.apply(&mut store).unwrap();

        assert_eq!(store.contact_email, None);
        assert_eq!(store.contact_phone, None);
    }

    #[test]
    fn test_apply_rejects_without_mutating() {
        let mut store = sample_store();
        let body = UpdateStoreRequest {
            name: Some(String::new()),
            slot_interval_minutes: Some(3),
            utc_offset_minutes: Some(900),
            contact_email: Some("nope".to_string()),
            mode: Some(StoreMode::Products),
            ..UpdateStoreRequest::default()
        };
        let errors = validation_errors(body.apply(&mut store));

        assert_eq!(errors.len(), 4);
        assert_eq!(store.mode, StoreMode::Bookings);
        assert_eq!(store.slot_interval_minutes, 30);
    }

    #[test]
    fn test_update_rejects_unknown_fields() {
        let json = r#"{"slug": "otra-tienda"}"#;
        assert!(serde_json::from_str::<UpdateStoreRequest>(json).is_err());
    }

    #[test]
    fn test_create_request_defaults_and_slug_case() {
        let json = r#"{"slug": " Tienda-Sol ", "name": "Tienda", "mode": "products"}"#;
        let body: CreateStoreRequest = serde_json::from_str(json).unwrap();
        let new = body.into_new_store().unwrap();
        assert_eq!(new.slug, "tienda-sol");
        assert_eq!(new.currency, CurrencyCode::default());
        assert_eq!(new.mode, StoreMode::Products);
        assert_eq!(new.description, "");
    }

    #[test]
    fn test_create_request_rejects_reserved_slug() {
        let json = r#"{"slug": "mine", "name": "", "mode": "bookings"}"#;
        let body: CreateStoreRequest = serde_json::from_str(json).unwrap();
        let errors = match body.into_new_store() {
            Err(AppError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        };
        assert_eq!(errors.len(), 2);
    }
}

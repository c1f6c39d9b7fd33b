//! Booking handlers.
//!
//! The customer reaches a booking with the `?token=` handed out at creation;
//! the owner reaches it through the session.

use axum::{extract::State, http::StatusCode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use vitrinex_core::{AccessToken, BookingId, BookingStatus, StoreMode};

use crate::db::bookings::{BookingFilter, BookingTarget};
use crate::db::{BookingRepository, ServiceRepository, StoreRepository};
use crate::error::{AppError, Result};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::{OptionalOwner, OwnerStore, store_for_owner};
use crate::models::Booking;
use crate::services::bookings::BookingRequest;
use crate::state::AppState;

/// `?token=` for customer access.
#[derive(Debug, Default, Deserialize)]
pub struct TokenParams {
    pub token: Option<AccessToken>,
}

/// `GET /api/bookings` filters.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<BookingStatus>,
    pub date: Option<NaiveDate>,
}

/// Body of `PUT /api/bookings/{id}/status`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusRequest {
    pub status: BookingStatus,
}

/// A new booking and the token the customer keeps.
#[derive(Debug, Serialize)]
pub struct CreatedBooking {
    pub booking: Booking,
    pub access_token: AccessToken,
}

/// Book a slot on a store's public page.
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
    AppJson(body): AppJson<BookingRequest>,
) -> Result<(StatusCode, AppJson<CreatedBooking>)> {
    let store = StoreRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Store not found".into()))?;
    if store.mode != StoreMode::Bookings {
        return Err(AppError::BadRequest("This store does not take bookings".into()));
    }

    let service = ServiceRepository::new(state.pool())
        .get(store.id, body.service_id)
        .await?
        .filter(|s| s.active)
        .ok_or_else(|| AppError::NotFound("Service not found".into()))?;

    let new = body.into_new_booking(&service)?;
    let booking = BookingRepository::new(state.pool())
        .create_if_available(store.id, &new, store.local_now())
        .await?;

    tracing::info!(
        store_id = %store.id,
        booking_id = %booking.id,
        date = %booking.date,
        slot = %booking.slot,
        "Booking created"
    );
    let access_token = booking.access_token;
    Ok((
        StatusCode::CREATED,
        AppJson(CreatedBooking {
            booking,
            access_token,
        }),
    ))
}

/// The owner's bookings, soonest first.
pub async fn list(
    State(state): State<AppState>,
    OwnerStore { store, .. }: OwnerStore,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<AppJson<Vec<Booking>>> {
    let filter = BookingFilter {
        status: params.status,
        date: params.date,
    };
    let bookings = BookingRepository::new(state.pool())
        .list(store.id, filter)
        .await?;
    Ok(AppJson(bookings))
}

/// One booking, for its customer or its store's owner.
pub async fn show(
    State(state): State<AppState>,
    OptionalOwner(owner): OptionalOwner,
    AppPath(id): AppPath<BookingId>,
    AppQuery(params): AppQuery<TokenParams>,
) -> Result<AppJson<Booking>> {
    let repo = BookingRepository::new(state.pool());
    let booking = match (params.token, owner) {
        (Some(token), _) => repo.get_by_token(id, token).await?,
        (None, Some(owner)) => {
            let store = store_for_owner(&state, &owner).await?;
            repo.get(store.id, id).await?
        }
        (None, None) => return Err(AppError::Unauthorized("Authentication required".into())),
    };
    booking
        .map(AppJson)
        .ok_or_else(|| AppError::NotFound("Booking not found".into()))
}

/// Owner status change, checked against the transition table.
#[instrument(skip(state, store), fields(store_id = %store.id))]
pub async fn update_status(
    State(state): State<AppState>,
    OwnerStore { store, .. }: OwnerStore,
    AppPath(id): AppPath<BookingId>,
    AppJson(body): AppJson<StatusRequest>,
) -> Result<AppJson<Booking>> {
    let booking = BookingRepository::new(state.pool())
        .transition(
            BookingTarget::Owner {
                store_id: store.id,
                id,
            },
            body.status,
        )
        .await?;
    tracing::info!(booking_id = %id, status = %booking.status, "Booking status changed");
    Ok(AppJson(booking))
}

/// Cancel a booking as its customer (with token) or as the owner.
#[instrument(skip(state, owner, params))]
pub async fn cancel(
    State(state): State<AppState>,
    OptionalOwner(owner): OptionalOwner,
    AppPath(id): AppPath<BookingId>,
    AppQuery(params): AppQuery<TokenParams>,
) -> Result<AppJson<Booking>> {
    let target = match (params.token, owner) {
        (Some(token), _) => BookingTarget::Customer { id, token },
        (None, Some(owner)) => BookingTarget::Owner {
            store_id: store_for_owner(&state, &owner).await?.id,
            id,
        },
        (None, None) => return Err(AppError::Unauthorized("Authentication required".into())),
    };

    let booking = BookingRepository::new(state.pool())
        .transition(target, BookingStatus::Cancelled)
        .await?;
    tracing::info!(booking_id = %id, "Booking cancelled");
    Ok(AppJson(booking))
}

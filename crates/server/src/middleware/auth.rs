//! Authentication extractors.
//!
//! Owners authenticate with a session cookie. Customers never log in; they
//! present a per-record access token handled by the routes themselves.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::db::StoreRepository;
use crate::error::{AppError, set_sentry_user};
use crate::models::{CurrentOwner, Store, session_keys};
use crate::state::AppState;

/// Extractor that requires an owner session.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireOwner(owner): RequireOwner) -> impl IntoResponse {
///     format!("Hello, {}!", owner.email)
/// }
/// ```
pub struct RequireOwner(pub CurrentOwner);

impl<S> FromRequestParts<S> for RequireOwner
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_owner(parts)
            .await
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))
    }
}

/// Extractor that optionally gets the current owner.
pub struct OptionalOwner(pub Option<CurrentOwner>);

impl<S> FromRequestParts<S> for OptionalOwner
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_owner(parts).await))
    }
}

/// Extractor for owner routes that act on the owner's store.
///
/// Rejects with 401 without a session and 404 if the owner has no store yet.
pub struct OwnerStore {
    pub owner: CurrentOwner,
    pub store: Store,
}

impl FromRequestParts<AppState> for OwnerStore {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireOwner(owner) = RequireOwner::from_request_parts(parts, state).await?;
        let store = store_for_owner(state, &owner).await?;
        Ok(Self { owner, store })
    }
}

/// The store of a logged-in owner.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the owner has not opened a store yet.
pub async fn store_for_owner(state: &AppState, owner: &CurrentOwner) -> Result<Store, AppError> {
    StoreRepository::new(state.pool())
        .get_by_owner(owner.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Create your store first".into()))
}

/// Read the owner from the session set by `SessionManagerLayer`.
async fn current_owner(parts: &Parts) -> Option<CurrentOwner> {
    let session = parts.extensions.get::<Session>()?;
    let owner: CurrentOwner = session
        .get(session_keys::CURRENT_OWNER)
        .await
        .ok()
        .flatten()?;
    set_sentry_user(&owner.id, Some(owner.email.as_str()));
    Some(owner)
}

/// Store the owner in the session, rotating the session ID first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_owner(
    session: &Session,
    owner: &CurrentOwner,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_OWNER, owner).await
}

/// Clear the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_owner(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

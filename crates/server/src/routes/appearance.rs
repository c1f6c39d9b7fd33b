//! Storefront appearance handlers.

use axum::extract::State;
use tracing::instrument;

use vitrinex_core::Appearance;

use crate::db::StoreRepository;
use crate::error::{AppError, Result};
use crate::extract::{AppJson, AppPath};
use crate::middleware::OwnerStore;
use crate::state::AppState;

/// Public appearance document of a store.
pub async fn show(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
) -> Result<AppJson<Appearance>> {
    let payload = state
        .storefronts()
        .get_or_load(state.pool(), &slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Store not found".into()))?;
    Ok(AppJson(payload.appearance.clone()))
}

/// Replace the owner's appearance document.
///
/// The body is taken as raw JSON so unknown keys and bad colors come back as
/// validation errors rather than a generic parse failure.
#[instrument(skip_all, fields(store_id = %store.id))]
pub async fn update(
    State(state): State<AppState>,
    OwnerStore { store, .. }: OwnerStore,
    AppJson(body): AppJson<serde_json::Value>,
) -> Result<AppJson<Appearance>> {
    let appearance =
        Appearance::from_json(body).map_err(|e| AppError::Validation(vec![e.to_string()]))?;
    let errors = appearance.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let saved = StoreRepository::new(state.pool())
        .update_appearance(store.id, &appearance)
        .await?;
    state.storefronts().invalidate(&saved.slug).await;
    Ok(AppJson(saved.appearance))
}

//! Owner dashboard numbers.

use axum::extract::State;

use crate::db::AnalyticsRepository;
use crate::error::Result;
use crate::extract::AppJson;
use crate::middleware::OwnerStore;
use crate::models::AnalyticsSnapshot;
use crate::state::AppState;

/// Aggregates for the owner's store, with "upcoming" measured from the
/// store-local date.
pub async fn show(
    State(state): State<AppState>,
    OwnerStore { store, .. }: OwnerStore,
) -> Result<AppJson<AnalyticsSnapshot>> {
    let today = store.local_now().date();
    let snapshot = AnalyticsRepository::new(state.pool())
        .snapshot(store.id, today)
        .await?;
    Ok(AppJson(snapshot))
}

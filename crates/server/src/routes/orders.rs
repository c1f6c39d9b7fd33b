//! Order handlers.
//!
//! Same access rules as bookings: `?token=` for the customer, session for the
//! owner. Placing and cancelling orders move stock, so both drop the cached
//! storefront.

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use vitrinex_core::{AccessToken, OrderId, OrderStatus, StoreMode};

use crate::db::orders::OrderTarget;
use crate::db::{OrderRepository, StoreRepository};
use crate::error::{AppError, Result};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::{OptionalOwner, OwnerStore, store_for_owner};
use crate::models::Order;
use crate::routes::bookings::TokenParams;
use crate::services::orders::OrderRequest;
use crate::state::AppState;

/// `GET /api/orders` filter.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<OrderStatus>,
}

/// Body of `PUT /api/orders/{id}/status`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusRequest {
    pub status: OrderStatus,
}

/// A new order and the token the customer keeps.
#[derive(Debug, Serialize)]
pub struct CreatedOrder {
    pub order: Order,
    pub access_token: AccessToken,
}

/// Place an order on a store's public page.
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
    AppJson(body): AppJson<OrderRequest>,
) -> Result<(StatusCode, AppJson<CreatedOrder>)> {
    let store = StoreRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Store not found".into()))?;
    if store.mode != StoreMode::Products {
        return Err(AppError::BadRequest("This store does not take orders".into()));
    }

    let new = body.into_new_order()?;
    let order = OrderRepository::new(state.pool())
        .create(store.id, &new)
        .await?;
    state.storefronts().invalidate(&store.slug).await;

    tracing::info!(
        store_id = %store.id,
        order_id = %order.id,
        total = %order.total,
        "Order placed"
    );
    let access_token = order.access_token;
    Ok((
        StatusCode::CREATED,
        AppJson(CreatedOrder {
            order,
            access_token,
        }),
    ))
}

/// The owner's orders, newest first.
pub async fn list(
    State(state): State<AppState>,
    OwnerStore { store, .. }: OwnerStore,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<AppJson<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list(store.id, params.status)
        .await?;
    Ok(AppJson(orders))
}

/// One order, for its customer or its store's owner.
pub async fn show(
    State(state): State<AppState>,
    OptionalOwner(owner): OptionalOwner,
    AppPath(id): AppPath<OrderId>,
    AppQuery(params): AppQuery<TokenParams>,
) -> Result<AppJson<Order>> {
    let repo = OrderRepository::new(state.pool());
    let order = match (params.token, owner) {
        (Some(token), _) => repo.get_by_token(id, token).await?,
        (None, Some(owner)) => {
            let store = store_for_owner(&state, &owner).await?;
            repo.get(store.id, id).await?
        }
        (None, None) => return Err(AppError::Unauthorized("Authentication required".into())),
    };
    order
        .map(AppJson)
        .ok_or_else(|| AppError::NotFound("Order not found".into()))
}

/// Owner status change, checked against the transition table.
#[instrument(skip(state, store), fields(store_id = %store.id))]
pub async fn update_status(
    State(state): State<AppState>,
    OwnerStore { store, .. }: OwnerStore,
    AppPath(id): AppPath<OrderId>,
    AppJson(body): AppJson<StatusRequest>,
) -> Result<AppJson<Order>> {
    let order = OrderRepository::new(state.pool())
        .transition(
            OrderTarget::Owner {
                store_id: store.id,
                id,
            },
            body.status,
        )
        .await?;
    if order.status == OrderStatus::Cancelled {
        state.storefronts().invalidate(&store.slug).await;
    }
    tracing::info!(order_id = %id, status = %order.status, "Order status changed");
    Ok(AppJson(order))
}

/// Cancel an order as its customer (with token) or as the owner. Tracked
/// stock is returned.
#[instrument(skip(state, owner, params))]
pub async fn cancel(
    State(state): State<AppState>,
    OptionalOwner(owner): OptionalOwner,
    AppPath(id): AppPath<OrderId>,
    AppQuery(params): AppQuery<TokenParams>,
) -> Result<AppJson<Order>> {
    let target = match (params.token, owner) {
        (Some(token), _) => OrderTarget::Customer { id, token },
        (None, Some(owner)) => OrderTarget::Owner {
            store_id: store_for_owner(&state, &owner).await?.id,
            id,
        },
        (None, None) => return Err(AppError::Unauthorized("Authentication required".into())),
    };

    let order = OrderRepository::new(state.pool())
        .transition(target, OrderStatus::Cancelled)
        .await?;
    if let Some(store) = StoreRepository::new(state.pool())
        .get_by_id(order.store_id)
        .await?
    {
        state.storefronts().invalidate(&store.slug).await;
    }
    tracing::info!(order_id = %id, "Order cancelled");
    Ok(AppJson(order))
}

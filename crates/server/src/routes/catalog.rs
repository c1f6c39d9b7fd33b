//! Owner catalog handlers: products and services.
//!
//! Every write drops the store's cached storefront.

use axum::{extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use vitrinex_core::{ProductId, ServiceId};

use crate::db::products::ProductInput;
use crate::db::services::{ServiceInput, ServiceRemoval};
use crate::db::{ProductRepository, ServiceRepository};
use crate::error::Result;
use crate::extract::{AppJson, AppPath};
use crate::middleware::OwnerStore;
use crate::models::{Product, Service};
use crate::state::AppState;
use crate::validation::{DESCRIPTION_MAX, NAME_MAX, Validator, clean_optional};

/// Shortest and longest service duration, in minutes.
const DURATION_RANGE: (u16, u16) = (5, 720);

const fn default_active() -> bool {
    true
}

/// Body of product create and update.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    /// `null` or absent means stock is not tracked.
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub position: i32,
}

impl ProductRequest {
    /// Validate into repository input.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` with every failing field.
    pub fn into_input(self) -> Result<ProductInput> {
        let mut v = Validator::new();
        v.required_text("name", &self.name, NAME_MAX)
            .optional_text("description", self.description.as_deref(), DESCRIPTION_MAX)
            .url("image_url", self.image_url.as_deref());
        if let Some(stock) = self.stock {
            v.range("stock", stock, 0, i32::MAX.unsigned_abs());
        }
        let price = v.price("price", self.price);
        v.finish()?;

        Ok(ProductInput {
            name: self.name.trim().to_string(),
            description: clean_optional(self.description).unwrap_or_default(),
            price: price.unwrap_or(self.price),
            stock: self.stock,
            image_url: clean_optional(self.image_url),
            active: self.active,
            position: self.position,
        })
    }
}

/// Body of service create and update.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub duration_minutes: u16,
    pub price: Decimal,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl ServiceRequest {
    /// Validate into repository input.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` with every failing field.
    pub fn into_input(self) -> Result<ServiceInput> {
        let mut v = Validator::new();
        v.required_text("name", &self.name, NAME_MAX)
            .optional_text("description", self.description.as_deref(), DESCRIPTION_MAX)
            .range(
                "duration_minutes",
                self.duration_minutes,
                DURATION_RANGE.0,
                DURATION_RANGE.1,
            );
        let price = v.price("price", self.price);
        v.finish()?;

        Ok(ServiceInput {
            name: self.name.trim().to_string(),
            description: clean_optional(self.description).unwrap_or_default(),
            duration_minutes: self.duration_minutes,
            price: price.unwrap_or(self.price),
            active: self.active,
        })
    }
}

/// Response of `DELETE /api/services/{id}`.
#[derive(Debug, Serialize)]
pub struct RemovalResponse {
    pub result: &'static str,
}

// =============================================================================
// Products
// =============================================================================

/// Every product of the owner's store, active or not.
pub async fn list_products(
    State(state): State<AppState>,
    OwnerStore { store, .. }: OwnerStore,
) -> Result<AppJson<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .list(store.id, false)
        .await?;
    Ok(AppJson(products))
}

#[instrument(skip_all, fields(store_id = %store.id))]
pub async fn create_product(
    State(state): State<AppState>,
    OwnerStore { store, .. }: OwnerStore,
    AppJson(body): AppJson<ProductRequest>,
) -> Result<(StatusCode, AppJson<Product>)> {
    let input = body.into_input()?;
    let product = ProductRepository::new(state.pool())
        .create(store.id, &input)
        .await?;
    state.storefronts().invalidate(&store.slug).await;
    Ok((StatusCode::CREATED, AppJson(product)))
}

#[instrument(skip_all, fields(store_id = %store.id, product_id = %id))]
pub async fn update_product(
    State(state): State<AppState>,
    OwnerStore { store, .. }: OwnerStore,
    AppPath(id): AppPath<ProductId>,
    AppJson(body): AppJson<ProductRequest>,
) -> Result<AppJson<Product>> {
    let input = body.into_input()?;
    let product = ProductRepository::new(state.pool())
        .update(store.id, id, &input)
        .await?;
    state.storefronts().invalidate(&store.slug).await;
    Ok(AppJson(product))
}

/// Delete a product. Past order items keep their snapshot.
#[instrument(skip_all, fields(store_id = %store.id, product_id = %id))]
pub async fn delete_product(
    State(state): State<AppState>,
    OwnerStore { store, .. }: OwnerStore,
    AppPath(id): AppPath<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool())
        .delete(store.id, id)
        .await?;
    state.storefronts().invalidate(&store.slug).await;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Services
// =============================================================================

/// Every service of the owner's store, active or not.
pub async fn list_services(
    State(state): State<AppState>,
    OwnerStore { store, .. }: OwnerStore,
) -> Result<AppJson<Vec<Service>>> {
    let services = ServiceRepository::new(state.pool())
        .list(store.id, false)
        .await?;
    Ok(AppJson(services))
}

#[instrument(skip_all, fields(store_id = %store.id))]
pub async fn create_service(
    State(state): State<AppState>,
    OwnerStore { store, .. }: OwnerStore,
    AppJson(body): AppJson<ServiceRequest>,
) -> Result<(StatusCode, AppJson<Service>)> {
    let input = body.into_input()?;
    let service = ServiceRepository::new(state.pool())
        .create(store.id, &input)
        .await?;
    state.storefronts().invalidate(&store.slug).await;
    Ok((StatusCode::CREATED, AppJson(service)))
}

#[instrument(skip_all, fields(store_id = %store.id, service_id = %id))]
pub async fn update_service(
    State(state): State<AppState>,
    OwnerStore { store, .. }: OwnerStore,
    AppPath(id): AppPath<ServiceId>,
    AppJson(body): AppJson<ServiceRequest>,
) -> Result<AppJson<Service>> {
    let input = body.into_input()?;
    let service = ServiceRepository::new(state.pool())
        .update(store.id, id, &input)
        .await?;
    state.storefronts().invalidate(&store.slug).await;
    Ok(AppJson(service))
}

/// Delete a service, or deactivate it when bookings reference it.
#[instrument(skip_all, fields(store_id = %store.id, service_id = %id))]
pub async fn delete_service(
    State(state): State<AppState>,
    OwnerStore { store, .. }: OwnerStore,
    AppPath(id): AppPath<ServiceId>,
) -> Result<AppJson<RemovalResponse>> {
    let removal = ServiceRepository::new(state.pool())
        .remove(store.id, id)
        .await?;
    state.storefronts().invalidate(&store.slug).await;

    let result = match removal {
        ServiceRemoval::Deleted => "deleted",
        ServiceRemoval::Deactivated => "deactivated",
    };
    Ok(AppJson(RemovalResponse { result }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn product(json: &str) -> ProductRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_product_defaults() {
        let input = product(r#"{"name": " Café molido ", "price": "149.9"}"#)
            .into_input()
            .unwrap();
        assert_eq!(input.name, "Café molido");
        assert!(input.active);
        assert_eq!(input.position, 0);
        assert_eq!(input.stock, None);
        assert_eq!(input.price, Decimal::new(14990, 2));
    }

    #[test]
    fn test_product_price_accepts_number() {
        let input = product(r#"{"name": "Taza", "price": 85, "stock": 3}"#)
            .into_input()
            .unwrap();
        assert_eq!(input.price, Decimal::new(85, 0));
        assert_eq!(input.stock, Some(3));
    }

    #[test]
    fn test_product_collects_errors() {
        let result = product(
            r#"{"name": "", "price": "-1", "image_url": "file:///etc/passwd"}"#,
        )
        .into_input();
        match result {
            Err(AppError::Validation(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_stock_rejected_at_parse() {
        assert!(
            serde_json::from_str::<ProductRequest>(r#"{"name": "x", "price": 1, "stock": -2}"#)
                .is_err()
        );
    }

    #[test]
    fn test_service_duration_bounds() {
        let parse = |minutes: u16| {
            serde_json::from_str::<ServiceRequest>(&format!(
                r#"{{"name": "Corte", "duration_minutes": {minutes}, "price": "180"}}"#
            ))
            .unwrap()
            .into_input()
        };
        assert!(parse(5).is_ok());
        assert!(parse(720).is_ok());
        assert!(parse(4).is_err());
        assert!(parse(721).is_err());
    }
}

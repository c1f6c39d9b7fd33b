//! Seed an owner, store and catalog from a YAML description.
//!
//! The file uses the same field names and rules as the API bodies. Everything
//! that can be checked without a database is validated before connecting.
//!
//! ```yaml
//! owner:
//!   email: ana@example.com
//!   name: Ana López
//!   password: a long demo password
//!   premium: true
//! store:
//!   slug: barberia-sol
//!   name: Barbería Sol
//!   mode: bookings
//!   currency: MXN
//! settings:
//!   schedule_text: Lun-Vie 9 a 18
//!   slot_interval_minutes: 30
//! services:
//!   - name: Corte clásico
//!     duration_minutes: 45
//!     price: "180.00"
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use vitrinex_core::{Email, Plan, SpecialDay};
use vitrinex_server::db::products::ProductInput;
use vitrinex_server::db::services::ServiceInput;
use vitrinex_server::db::stores::NewStore;
use vitrinex_server::db::{ProductRepository, ServiceRepository, StoreRepository};
use vitrinex_server::error::AppError;
use vitrinex_server::routes::catalog::{ProductRequest, ServiceRequest};
use vitrinex_server::routes::stores::{CreateStoreRequest, UpdateStoreRequest};
use vitrinex_server::services::auth::{AuthService, validate_password};

use super::{CliError, connect};

/// Owner section of a seed file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedOwner {
    pub email: String,
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub premium: bool,
}

/// A whole seed file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    pub owner: SeedOwner,
    pub store: CreateStoreRequest,
    #[serde(default)]
    pub settings: Option<UpdateStoreRequest>,
    #[serde(default)]
    pub products: Vec<ProductRequest>,
    #[serde(default)]
    pub services: Vec<ServiceRequest>,
    #[serde(default)]
    pub special_days: Vec<SpecialDay>,
}

/// A seed file after validation.
struct SeedPlan {
    owner: SeedOwner,
    store: NewStore,
    settings: Option<UpdateStoreRequest>,
    products: Vec<ProductInput>,
    services: Vec<ServiceInput>,
    special_days: Vec<SpecialDay>,
}

/// Validate a parsed seed file, collecting every problem.
fn validate(file: SeedFile) -> Result<SeedPlan, Vec<String>> {
    let mut errors = Vec::new();

    if let Err(e) = Email::parse(&file.owner.email) {
        errors.push(format!("owner.email: {e}"));
    }
    if file.owner.name.trim().is_empty() {
        errors.push("owner.name is required".to_string());
    }
    if let Err(e) = validate_password(&file.owner.password) {
        errors.push(format!("owner.password: {e}"));
    }

    let mut collect = |prefix: String, err: AppError| match err {
        AppError::Validation(messages) => {
            errors.extend(messages.into_iter().map(|m| format!("{prefix}: {m}")));
        }
        other => errors.push(format!("{prefix}: {other}")),
    };

    let store = file
        .store
        .into_new_store()
        .map_err(|e| collect("store".to_string(), e))
        .ok();
    let products: Vec<_> = file
        .products
        .into_iter()
        .enumerate()
        .filter_map(|(i, p)| {
            p.into_input()
                .map_err(|e| collect(format!("products[{i}]"), e))
                .ok()
        })
        .collect();
    let services: Vec<_> = file
        .services
        .into_iter()
        .enumerate()
        .filter_map(|(i, s)| {
            s.into_input()
                .map_err(|e| collect(format!("services[{i}]"), e))
                .ok()
        })
        .collect();

    for day in &file.special_days {
        errors.extend(
            day.validate()
                .into_iter()
                .map(|m| format!("special_days[{}]: {m}", day.date)),
        );
    }

    match store {
        Some(store) if errors.is_empty() => Ok(SeedPlan {
            owner: file.owner,
            store,
            settings: file.settings,
            products,
            services,
            special_days: file.special_days,
        }),
        _ => Err(errors),
    }
}

/// Seed from a YAML file.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid, or a database
/// operation fails.
pub async fn run(file_path: &str) -> Result<(), CliError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading seed file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Io {
            path: file_path.to_owned(),
            source,
        })?;
    let file: SeedFile = serde_yaml::from_str(&content)?;

    let plan = match validate(file) {
        Ok(plan) => plan,
        Err(errors) => {
            error!("Seed file validation failed:");
            for err in &errors {
                error!("  - {err}");
            }
            return Err(CliError::Invalid(format!(
                "{} validation errors found",
                errors.len()
            )));
        }
    };
    info!("Seed file validated successfully");

    let pool = connect().await?;

    let tier = if plan.owner.premium {
        Plan::Premium
    } else {
        Plan::Free
    };
    let owner = AuthService::new(&pool)
        .register(
            &plan.owner.email,
            &plan.owner.name,
            &plan.owner.password,
            tier,
        )
        .await?;
    info!(owner_id = %owner.id, "Owner created");

    let stores = StoreRepository::new(&pool);
    let mut store = stores.create(owner.id, &plan.store).await?;
    if let Some(settings) = plan.settings {
        settings
            .apply(&mut store)
            .map_err(|e| CliError::Invalid(format!("settings: {e}")))?;
        store = stores.save(&store).await?;
    }
    info!(store_id = %store.id, slug = %store.slug, "Store created");

    let products = ProductRepository::new(&pool);
    for input in &plan.products {
        products.create(store.id, input).await?;
    }
    let services = ServiceRepository::new(&pool);
    for input in &plan.services {
        services.create(store.id, input).await?;
    }
    for day in &plan.special_days {
        stores.upsert_special_day(store.id, day).await?;
    }

    info!("Seeding complete!");
    info!("  Products: {}", plan.products.len());
    info!("  Services: {}", plan.services.len());
    info!("  Special days: {}", plan.special_days.len());
    Ok(())
}

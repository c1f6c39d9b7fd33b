//! Public storefront payload with an in-memory cache.
//!
//! `GET /api/stores/{slug}` is the hottest read in the API. The assembled
//! payload is cached per slug with `moka` and dropped whenever the owner
//! changes anything it contains.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, instrument};

use vitrinex_core::{Appearance, StoreMode};

use crate::db::{ProductRepository, RepositoryError, ServiceRepository, StoreRepository};
use crate::models::{Product, PublicStore, Service, Store};

/// How long a payload stays cached.
const CACHE_TTL: Duration = Duration::from_secs(60);

/// Most payloads held at once.
const CACHE_CAPACITY: u64 = 1000;

/// Everything a customer-facing page needs to render a store.
#[derive(Debug, Clone, Serialize)]
pub struct StorefrontPayload {
    pub store: PublicStore,
    pub appearance: Appearance,
    /// Active products; empty for `bookings` stores.
    pub products: Vec<Product>,
    /// Active services; empty for `products` stores.
    pub services: Vec<Service>,
}

/// Cache of storefront payloads keyed by slug.
#[derive(Clone)]
pub struct StorefrontCache {
    cache: Cache<String, Arc<StorefrontPayload>>,
}

impl Default for StorefrontCache {
    fn default() -> Self {
        Self::new()
    }
}

impl StorefrontCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(CACHE_TTL)
                .build(),
        }
    }

    /// Cached payload for `slug`, loading it on a miss.
    ///
    /// Returns `None` when no store has this slug. Misses are not cached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if loading fails.
    #[instrument(skip(self, pool))]
    pub async fn get_or_load(
        &self,
        pool: &PgPool,
        slug: &str,
    ) -> Result<Option<Arc<StorefrontPayload>>, RepositoryError> {
        if let Some(payload) = self.cache.get(slug).await {
            debug!("Cache hit for storefront");
            return Ok(Some(payload));
        }

        let Some(store) = StoreRepository::new(pool).get_by_slug(slug).await? else {
            return Ok(None);
        };
        let payload = Arc::new(load_payload(pool, &store).await?);
        self.cache
            .insert(slug.to_string(), Arc::clone(&payload))
            .await;
        Ok(Some(payload))
    }

    /// Drop the cached payload of a store.
    pub async fn invalidate(&self, slug: &str) {
        self.cache.invalidate(slug).await;
        debug!(slug, "Storefront cache invalidated");
    }

    /// Number of cached payloads, after pending maintenance.
    pub async fn len(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }

    /// Whether nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Assemble the payload for a store from the database.
async fn load_payload(pool: &PgPool, store: &Store) -> Result<StorefrontPayload, RepositoryError> {
    let (products, services) = match store.mode {
        StoreMode::Products => (
            ProductRepository::new(pool).list(store.id, true).await?,
            Vec::new(),
        ),
        StoreMode::Bookings => (
            Vec::new(),
            ServiceRepository::new(pool).list(store.id, true).await?,
        ),
    };

    Ok(StorefrontPayload {
        store: PublicStore::from(store),
        appearance: store.appearance.clone(),
        products,
        services,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::store::tests::sample_store;

    fn payload() -> Arc<StorefrontPayload> {
        let store = sample_store();
        Arc::new(StorefrontPayload {
            store: PublicStore::from(&store),
            appearance: store.appearance,
            products: Vec::new(),
            services: Vec::new(),
        })
    }

    #[tokio::test]
    async fn test_invalidate_removes_entry() {
        let cache = StorefrontCache::new();
        cache
            .cache
            .insert("barberia-sol".to_string(), payload())
            .await;
        assert_eq!(cache.len().await, 1);

        cache.invalidate("barberia-sol").await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalidate_other_slug_keeps_entry() {
        let cache = StorefrontCache::new();
        cache
            .cache
            .insert("barberia-sol".to_string(), payload())
            .await;
        cache.invalidate("otra-tienda").await;
        assert_eq!(cache.len().await, 1);
    }

    #[test]
    fn test_payload_has_no_owner_data() {
        let json = serde_json::to_value(&*payload()).expect("serialize");
        assert!(json["store"].get("owner_id").is_none());
        assert_eq!(json["appearance"]["layout"], "grid");
    }
}

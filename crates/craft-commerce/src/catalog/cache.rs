//! Time-limited catalog cache.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::catalog::{Category, Product};
use crate::error::CommerceError;
use crate::ids::ProductId;
use crate::remote::RemoteStore;

/// Default time a fetched catalog stays fresh.
pub const DEFAULT_CATALOG_TTL: Duration = Duration::from_secs(300);

#[derive(Debug)]
struct Entry<T> {
    items: Vec<T>,
    fetched_at: Instant,
    expired: bool,
}

impl<T> Entry<T> {
    fn is_fresh(&self, ttl: Duration) -> bool {
        !self.expired && self.fetched_at.elapsed() < ttl
    }
}

/// Products and categories fetched once and reused until the TTL runs out.
///
/// A refetch that fails or times out serves the stale copy when there is
/// one; only a cold cache surfaces the error.
#[derive(Debug)]
pub struct CatalogCache {
    remote: RemoteStore,
    ttl: Duration,
    products: Mutex<Option<Entry<Product>>>,
    categories: Mutex<Option<Entry<Category>>>,
}

impl CatalogCache {
    pub fn new(remote: RemoteStore) -> Self {
        Self::with_ttl(remote, DEFAULT_CATALOG_TTL)
    }

    pub fn with_ttl(remote: RemoteStore, ttl: Duration) -> Self {
        Self {
            remote,
            ttl,
            products: Mutex::new(None),
            categories: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// All products.
    pub async fn products(&self) -> Result<Vec<Product>, CommerceError> {
        cached(&self.products, self.ttl, "products", || self.remote.products()).await
    }

    /// All categories.
    pub async fn categories(&self) -> Result<Vec<Category>, CommerceError> {
        cached(&self.categories, self.ttl, "categories", || self.remote.categories()).await
    }

    /// Find a product by id in the cached catalog.
    pub async fn product(&self, id: &ProductId) -> Result<Option<Product>, CommerceError> {
        Ok(self.products().await?.into_iter().find(|p| &p.id == id))
    }

    /// Products in a category, compared case-insensitively.
    pub async fn products_in(&self, category: &str) -> Result<Vec<Product>, CommerceError> {
        Ok(self
            .products()
            .await?
            .into_iter()
            .filter(|p| {
                p.category
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(category))
            })
            .collect())
    }

    /// Drop everything cached.
    pub async fn invalidate(&self) {
        *self.products.lock().await = None;
        *self.categories.lock().await = None;
        tracing::debug!("catalog cache invalidated");
    }

    /// Mark the cache stale and fetch again.
    pub async fn refresh(&self) -> Result<(), CommerceError> {
        expire(&self.products).await;
        expire(&self.categories).await;
        self.products().await?;
        self.categories().await?;
        Ok(())
    }
}

async fn expire<T>(slot: &Mutex<Option<Entry<T>>>) {
    // The items stay as a fallback for the refetch.
    if let Some(entry) = slot.lock().await.as_mut() {
        entry.expired = true;
    }
}

async fn cached<T, F, Fut>(
    slot: &Mutex<Option<Entry<T>>>,
    ttl: Duration,
    what: &'static str,
    fetch: F,
) -> Result<Vec<T>, CommerceError>
where
    T: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>, CommerceError>>,
{
    let mut slot = slot.lock().await;
    if let Some(entry) = slot.as_ref().filter(|e| e.is_fresh(ttl)) {
        return Ok(entry.items.clone());
    }

    match fetch().await {
        Ok(items) => {
            tracing::debug!(what, count = items.len(), "catalog fetched");
            *slot = Some(Entry {
                items: items.clone(),
                fetched_at: Instant::now(),
                expired: false,
            });
            Ok(items)
        }
        Err(e) => match slot.as_ref() {
            Some(stale) => {
                tracing::warn!(what, error = %e, "catalog fetch failed, serving stale copy");
                Ok(stale.items.clone())
            }
            None => Err(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::tables;
    use craft_data::TimeoutConfig;
    use craft_db::{Db, Fault, FaultyStore, MemoryStore, Operation};
    use serde_json::json;
    use std::sync::Arc;

    fn setup() -> (CatalogCache, Arc<FaultyStore<MemoryStore>>) {
        let store = Arc::new(FaultyStore::new(
            MemoryStore::new()
                .with_rows(
                    tables::PRODUCTS,
                    [
                        json!({"id": "p1", "name": "Espresso", "price": 35, "category": "Hot"}),
                        json!({"id": "p2", "name": "Cold Brew", "price": 50, "category": "Iced"}),
                    ],
                )
                .with_rows(tables::CATEGORIES, [json!({"id": 1, "name": "Hot"})]),
        ));
        let remote = RemoteStore::new(Db::new(store.clone()), TimeoutConfig::default());
        (CatalogCache::new(remote), store)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_once_within_ttl() {
        let (cache, store) = setup();
        assert_eq!(cache.products().await.unwrap().len(), 2);
        tokio::time::advance(Duration::from_secs(120)).await;
        assert_eq!(cache.products().await.unwrap().len(), 2);

        assert_eq!(store.call_count(tables::PRODUCTS, Operation::Select), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetches_after_ttl() {
        let (cache, store) = setup();
        cache.products().await.unwrap();
        tokio::time::advance(DEFAULT_CATALOG_TTL + Duration::from_secs(1)).await;
        cache.products().await.unwrap();

        assert_eq!(store.call_count(tables::PRODUCTS, Operation::Select), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_copy_on_timeout() {
        let (cache, store) = setup();
        cache.products().await.unwrap();

        store.inject(tables::PRODUCTS, Operation::Select, Fault::Hang);
        tokio::time::advance(DEFAULT_CATALOG_TTL).await;

        let products = cache.products().await.unwrap();
        assert_eq!(products.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cold_cache_surfaces_error() {
        let (cache, store) = setup();
        store.inject(tables::PRODUCTS, Operation::Select, Fault::Fail);
        assert!(cache.products().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_and_refresh() {
        let (cache, store) = setup();
        cache.products().await.unwrap();
        cache.invalidate().await;
        cache.products().await.unwrap();
        cache.refresh().await.unwrap();

        assert_eq!(store.call_count(tables::PRODUCTS, Operation::Select), 3);
        assert_eq!(store.call_count(tables::CATEGORIES, Operation::Select), 1);
        assert_eq!(cache.products_in("hot").await.unwrap().len(), 1);
    }
}

//! Cached product catalog
//!
//! Read-through cache over the paginated tenant listings. A fetch walks
//! pages sequentially until a short page, normalizes every object into a
//! [`ProductRecord`], and caches the result under a per-partition key.
//! When the upstream fails and a cached copy still exists, the cached
//! copy is served instead of the error.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use common::{Cache, SettingsStore};

use crate::client::ApiClient;
use crate::endpoints::{CACHE_TTL_SETTING, DEFAULT_CACHE_TTL};
use crate::error::Result;
use crate::records::{ProductRecord, ProductType};

/// Upstream page size; a shorter page ends the walk.
const PAGE_SIZE: usize = 100;

/// Hard ceiling on pages fetched per partition.
const MAX_PAGES: usize = 20;

/// Cache key prefix; the suffix is the partition name or `all`.
const CACHE_KEY_PREFIX: &str = "products_";

/// Read-through product catalog for one tenant.
pub struct ProductService {
    api: ApiClient,
    cache: Arc<dyn Cache>,
    settings: Arc<dyn SettingsStore>,
}

impl ProductService {
    pub fn new(api: ApiClient, cache: Arc<dyn Cache>, settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            api,
            cache,
            settings,
        }
    }

    /// The catalog for one partition, or both when `product_type` is
    /// `None`. Serves the cached copy unless `force_refresh` is set; on
    /// an upstream error a still-cached copy wins over the error.
    pub async fn get_products(
        &self,
        product_type: Option<ProductType>,
        force_refresh: bool,
    ) -> Result<Vec<ProductRecord>> {
        let key = cache_key(product_type);

        if !force_refresh {
            if let Some(records) = self.read_cache(&key) {
                debug!(key = %key, count = records.len(), "cache hit");
                return Ok(records);
            }
        }

        let fetched = match self.fetch(product_type).await {
            Ok(records) => records,
            Err(e) => {
                if let Some(records) = self.read_cache(&key) {
                    warn!(key = %key, error = %e, "serving cached products after fetch failure");
                    return Ok(records);
                }
                return Err(e);
            }
        };

        let ttl = self.cache_ttl();
        self.write_cache(&key, &fetched, ttl);
        if product_type.is_none() {
            // Partition the combined result so qualified reads also hit
            for pt in ProductType::all() {
                let subset: Vec<ProductRecord> = fetched
                    .iter()
                    .filter(|r| r.product_type == pt)
                    .cloned()
                    .collect();
                self.write_cache(&cache_key(Some(pt)), &subset, ttl);
            }
        }

        info!(key = %key, count = fetched.len(), "products fetched");
        Ok(fetched)
    }

    /// Drop every cached partition. The next read fetches fresh.
    pub fn clear_cache(&self) {
        self.cache.delete(&cache_key(None));
        for pt in ProductType::all() {
            self.cache.delete(&cache_key(Some(pt)));
        }
        info!("product cache cleared");
    }

    async fn fetch(&self, product_type: Option<ProductType>) -> Result<Vec<ProductRecord>> {
        match product_type {
            Some(pt) => self.fetch_all_pages(pt).await,
            None => {
                let mut combined = Vec::new();
                for pt in ProductType::all() {
                    combined.extend(self.fetch_all_pages(pt).await?);
                }
                Ok(combined)
            }
        }
    }

    async fn fetch_all_pages(&self, product_type: ProductType) -> Result<Vec<ProductRecord>> {
        let path = self.listing_path(product_type);
        let mut records = Vec::new();

        for page in 1..=MAX_PAGES {
            let body = self
                .api
                .request(
                    &path,
                    &[
                        ("page", page.to_string()),
                        ("page_size", PAGE_SIZE.to_string()),
                    ],
                )
                .await?;

            let items = extract_items(&body);
            let raw_count = items.len();
            records.extend(
                items
                    .iter()
                    .filter(|item| item.is_object())
                    .map(|item| ProductRecord::from_raw(item, product_type)),
            );

            if raw_count < PAGE_SIZE {
                break;
            }
        }

        debug!(
            partition = product_type.as_str(),
            count = records.len(),
            "partition fetched"
        );
        Ok(records)
    }

    fn listing_path(&self, product_type: ProductType) -> String {
        self.settings
            .get(product_type.endpoint_setting())
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| product_type.default_path().to_string())
    }

    fn cache_ttl(&self) -> Duration {
        let seconds = self
            .settings
            .get(CACHE_TTL_SETTING)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_CACHE_TTL);
        Duration::from_secs(seconds)
    }

    fn read_cache(&self, key: &str) -> Option<Vec<ProductRecord>> {
        let blob = self.cache.get(key)?;
        serde_json::from_str(&blob).ok()
    }

    fn write_cache(&self, key: &str, records: &[ProductRecord], ttl: Duration) {
        if let Ok(blob) = serde_json::to_string(records) {
            self.cache.set(key, &blob, ttl);
        }
    }
}

fn cache_key(product_type: Option<ProductType>) -> String {
    match product_type {
        Some(pt) => format!("{CACHE_KEY_PREFIX}{}", pt.as_str()),
        None => format!("{CACHE_KEY_PREFIX}all"),
    }
}

/// The list payload out of a page body: `results`, then `items`, then a
/// top-level array. Anything else is an empty page.
fn extract_items(body: &Value) -> &[Value] {
    if let Some(results) = body.get("results").and_then(Value::as_array) {
        return results;
    }
    if let Some(items) = body.get("items").and_then(Value::as_array) {
        return items;
    }
    if let Some(list) = body.as_array() {
        return list;
    }
    &[]
}

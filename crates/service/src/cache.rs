//! In-process read-through cache keyed by `region:key`.
//!
//! Values are stored as JSON so one cache can hold every DTO type. A disabled
//! cache calls straight through to the loader.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::ServiceError;

pub const REGION_DISTRICTS: &str = "districts";
pub const REGION_PLAYERS: &str = "players";
pub const REGION_TOURNAMENTS: &str = "tournaments";
pub const REGION_NEWS: &str = "news";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Clone)]
pub struct AppCache {
    inner: Option<Cache<String, Arc<serde_json::Value>>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl AppCache {
    pub fn new(cfg: &configs::CacheConfig) -> Self {
        if !cfg.enabled {
            return Self::disabled();
        }
        let cache = Cache::builder()
            .max_capacity(cfg.max_capacity)
            .time_to_live(Duration::from_secs(cfg.ttl_secs))
            .support_invalidation_closures()
            .build();
        Self { inner: Some(cache), hits: Arc::default(), misses: Arc::default() }
    }

    pub fn disabled() -> Self {
        Self { inner: None, hits: Arc::default(), misses: Arc::default() }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Returns the cached value or runs `load` and caches its result. Errors are not cached.
    pub async fn get_or_try_insert<T, F, Fut>(&self, region: &str, key: &str, load: F) -> Result<T, ServiceError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let Some(cache) = &self.inner else {
            return load().await;
        };
        let cache_key = format!("{region}:{key}");
        if let Some(v) = cache.get(&cache_key).await {
            match T::deserialize(v.as_ref()) {
                Ok(hit) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(hit);
                }
                Err(e) => warn!(key = %cache_key, error = %e, "dropping undecodable cache entry"),
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = load().await?;
        match serde_json::to_value(&value) {
            Ok(json) => cache.insert(cache_key, Arc::new(json)).await,
            Err(e) => warn!(key = %cache_key, error = %e, "value not cacheable"),
        }
        Ok(value)
    }

    /// Drops every entry of `region`.
    pub fn invalidate_region(&self, region: &str) {
        let Some(cache) = &self.inner else { return };
        let prefix = format!("{region}:");
        match cache.invalidate_entries_if(move |k, _| k.starts_with(&prefix)) {
            Ok(_) => debug!(region, "cache region invalidated"),
            Err(e) => {
                warn!(region, error = %e, "region invalidation failed; clearing cache");
                cache.invalidate_all();
            }
        }
    }

    pub fn clear(&self) {
        if let Some(cache) = &self.inner {
            cache.invalidate_all();
        }
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = match &self.inner {
            Some(cache) => {
                cache.run_pending_tasks().await;
                cache.entry_count()
            }
            None => 0,
        };
        CacheStats {
            enabled: self.is_enabled(),
            entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

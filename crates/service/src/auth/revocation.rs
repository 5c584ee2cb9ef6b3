//! Revoked token ids, held until the token would have expired anyway.

use std::time::{Duration, Instant};

use chrono::Utc;
use moka::future::Cache;
use moka::Expiry;

struct UntilTokenExpiry;

impl Expiry<String, Instant> for UntilTokenExpiry {
    fn expire_after_create(&self, _key: &String, value: &Instant, created_at: Instant) -> Option<Duration> {
        Some(value.saturating_duration_since(created_at))
    }
}

#[derive(Clone)]
pub struct RevocationList {
    cache: Cache<String, Instant>,
}

impl RevocationList {
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_capacity).expire_after(UntilTokenExpiry).build();
        Self { cache }
    }

    /// Revokes `jti` until the unix timestamp `exp`. Already-expired tokens are ignored.
    pub async fn revoke(&self, jti: &str, exp: i64) {
        let remaining = exp - Utc::now().timestamp();
        if remaining <= 0 {
            return;
        }
        let until = Instant::now() + Duration::from_secs(remaining as u64);
        self.cache.insert(jti.to_string(), until).await;
    }

    pub async fn is_revoked(&self, jti: &str) -> bool {
        self.cache.get(jti).await.is_some()
    }

    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RevocationList {
    fn default() -> Self {
        Self::new(100_000)
    }
}

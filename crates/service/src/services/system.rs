use std::time::Instant;

use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, DatabaseConnection};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::{AppCache, CacheStats};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseHealth {
    pub up: bool,
    pub backend: String,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemHealth {
    /// `UP` when the database answers, `DEGRADED` otherwise.
    pub status: String,
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
    pub database: DatabaseHealth,
    pub cache: CacheStats,
}

pub async fn ping(db: &DatabaseConnection) -> DatabaseHealth {
    let start = Instant::now();
    let result = db.ping().await;
    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    let backend = format!("{:?}", db.get_database_backend());
    match result {
        Ok(()) => DatabaseHealth { up: true, backend, latency_ms, error: None },
        Err(e) => {
            warn!(error = %e, "database ping failed");
            DatabaseHealth { up: false, backend, latency_ms, error: Some(e.to_string()) }
        }
    }
}

pub async fn health(db: &DatabaseConnection, cache: &AppCache, started_at: DateTime<Utc>) -> SystemHealth {
    let database = ping(db).await;
    let uptime_secs = u64::try_from((Utc::now() - started_at).num_seconds()).unwrap_or(0);
    SystemHealth {
        status: if database.up { "UP" } else { "DEGRADED" }.to_string(),
        version: VERSION.to_string(),
        started_at,
        uptime_secs,
        database,
        cache: cache.stats().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::memory_db;

    #[tokio::test]
    async fn health_reports_database_and_cache() {
        let db = memory_db().await;
        let started = Utc::now() - chrono::Duration::seconds(5);
        let h = health(&db, &AppCache::disabled(), started).await;
        assert_eq!(h.status, "UP");
        assert!(h.database.up);
        assert_eq!(h.database.backend, "Sqlite");
        assert!(h.uptime_secs >= 5);
        assert!(!h.cache.enabled);
    }
}

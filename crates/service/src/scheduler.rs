//! Background maintenance tasks.

use std::time::Duration;

use chrono::Utc;
use sea_orm::DatabaseConnection;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cache::AppCache;
use crate::services::{audit, news};

const RETENTION_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Publishes due scheduled news every `every`. `None` when `every` is zero.
pub fn spawn_publisher(db: DatabaseConnection, cache: AppCache, every: Duration) -> Option<JoinHandle<()>> {
    if every.is_zero() {
        info!("scheduled publication task disabled");
        return None;
    }
    info!(interval_secs = every.as_secs(), "scheduled publication task started");
    Some(tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            match news::publish_due(&db, &cache, Utc::now()).await {
                Ok(ids) if ids.is_empty() => debug!("no scheduled news due"),
                Ok(ids) => info!(count = ids.len(), "published scheduled news"),
                Err(e) => warn!(error = %e, "scheduled publication failed"),
            }
        }
    }))
}

/// Purges audit rows older than `retention_days` once a day. `None` when zero.
pub fn spawn_audit_retention(db: DatabaseConnection, retention_days: u32) -> Option<JoinHandle<()>> {
    if retention_days == 0 {
        return None;
    }
    Some(tokio::spawn(async move {
        let mut ticker = interval(RETENTION_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(e) = audit::purge_older_than(&db, retention_days).await {
                warn!(error = %e, "audit retention purge failed");
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::Pagination;
    use crate::services::news::NewsInput;
    use crate::test_support::memory_db;
    use models::news_article::NewsStatus;

    #[tokio::test]
    async fn zero_interval_disables_tasks() {
        let db = memory_db().await;
        assert!(spawn_publisher(db.clone(), AppCache::disabled(), Duration::ZERO).is_none());
        assert!(spawn_audit_retention(db, 0).is_none());
    }

    #[tokio::test]
    async fn publisher_publishes_due_articles() -> anyhow::Result<()> {
        let db = memory_db().await;
        let cache = AppCache::disabled();
        let article = news::create(
            &db,
            &cache,
            None,
            NewsInput { title: "Soon".into(), slug: None, summary: None, content: "x".into(), featured: None },
        )
        .await?;
        news::schedule(&db, &cache, article.id, Utc::now() + chrono::Duration::milliseconds(50)).await?;

        let handle = spawn_publisher(db.clone(), cache.clone(), Duration::from_millis(20)).expect("task");
        let mut published = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if news::find(&db, article.id).await?.status == NewsStatus::Published {
                published = true;
                break;
            }
        }
        handle.abort();
        assert!(published);
        assert_eq!(news::list_scheduled(&db, Pagination::default()).await?.total_items, 0);
        Ok(())
    }
}

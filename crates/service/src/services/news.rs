use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::news_article::{self, slugify, NewsStatus};

use crate::cache::{AppCache, REGION_NEWS};
use crate::errors::ServiceError;
use crate::pagination::{fetch_page, Page, Pagination};
use crate::services::clean;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsInput {
    pub title: String,
    /// Generated from the title when absent.
    pub slug: Option<String>,
    pub summary: Option<String>,
    pub content: String,
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsFilter {
    /// Honoured only for callers allowed to see unpublished articles.
    pub status: Option<NewsStatus>,
    pub featured: Option<bool>,
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    pub publish_at: DateTime<Utc>,
}

/// Public callers (`include_unpublished == false`) only ever see `PUBLISHED` articles.
pub async fn list(
    db: &DatabaseConnection,
    filter: NewsFilter,
    include_unpublished: bool,
    pagination: Pagination,
) -> Result<Page<news_article::Model>, ServiceError> {
    let mut select = news_article::Entity::find();
    let status = if include_unpublished { filter.status } else { Some(NewsStatus::Published) };
    if let Some(status) = status {
        select = select.filter(news_article::Column::Status.eq(status));
    }
    if let Some(featured) = filter.featured {
        select = select.filter(news_article::Column::Featured.eq(featured));
    }
    if let Some(q) = clean(filter.q) {
        select = select.filter(
            Condition::any()
                .add(news_article::Column::Title.contains(&q))
                .add(news_article::Column::Summary.contains(&q)),
        );
    }
    let select = select
        .order_by_desc(news_article::Column::PublishedAt)
        .order_by_desc(news_article::Column::CreatedAt);
    Ok(fetch_page(db, select, pagination).await?)
}

pub async fn find(db: &DatabaseConnection, id: Uuid) -> Result<news_article::Model, ServiceError> {
    news_article::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("news article", id))
}

pub async fn get(db: &DatabaseConnection, cache: &AppCache, id: Uuid, include_unpublished: bool) -> Result<news_article::Model, ServiceError> {
    let article = cache
        .get_or_try_insert(REGION_NEWS, &format!("id:{id}"), || find(db, id))
        .await?;
    visible(article, include_unpublished, &id.to_string())
}

pub async fn get_by_slug(db: &DatabaseConnection, cache: &AppCache, slug: &str, include_unpublished: bool) -> Result<news_article::Model, ServiceError> {
    let article = cache
        .get_or_try_insert(REGION_NEWS, &format!("slug:{slug}"), || async move {
            news_article::Entity::find()
                .filter(news_article::Column::Slug.eq(slug))
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::not_found("news article", slug))
        })
        .await?;
    visible(article, include_unpublished, slug)
}

fn visible(article: news_article::Model, include_unpublished: bool, key: &str) -> Result<news_article::Model, ServiceError> {
    if include_unpublished || article.status == NewsStatus::Published {
        Ok(article)
    } else {
        Err(ServiceError::not_found("news article", key))
    }
}

/// First free slug among `base`, `base-2`, `base-3`, ...
pub async fn unique_slug(db: &DatabaseConnection, base: &str, exclude: Option<Uuid>) -> Result<String, ServiceError> {
    let base = if base.is_empty() { "article" } else { base };
    let mut candidate = base.to_string();
    let mut n = 1;
    loop {
        let mut q = news_article::Entity::find().filter(news_article::Column::Slug.eq(candidate.as_str()));
        if let Some(id) = exclude {
            q = q.filter(news_article::Column::Id.ne(id));
        }
        if q.count(db).await? == 0 {
            return Ok(candidate);
        }
        n += 1;
        candidate = format!("{base}-{n}");
    }
}

#[instrument(skip(db, cache, input), fields(title = %input.title))]
pub async fn create(db: &DatabaseConnection, cache: &AppCache, author_id: Option<Uuid>, input: NewsInput) -> Result<news_article::Model, ServiceError> {
    let slug = match clean(input.slug) {
        Some(explicit) => explicit.to_lowercase(),
        None => unique_slug(db, &slugify(&input.title), None).await?,
    };
    let now = Utc::now().into();
    let model = news_article::Model {
        id: Uuid::new_v4(),
        title: input.title.trim().to_string(),
        slug,
        summary: clean(input.summary),
        content: input.content,
        author_id,
        status: NewsStatus::Draft,
        featured: input.featured.unwrap_or(false),
        publish_at: None,
        published_at: None,
        created_at: now,
        updated_at: now,
    };
    let created = news_article::create(db, model).await?;
    cache.invalidate_region(REGION_NEWS);
    info!(article_id = %created.id, slug = %created.slug, "news_created");
    Ok(created)
}

#[instrument(skip(db, cache, input))]
pub async fn update(db: &DatabaseConnection, cache: &AppCache, id: Uuid, input: NewsInput) -> Result<news_article::Model, ServiceError> {
    let mut m = find(db, id).await?;
    m.title = input.title.trim().to_string();
    if let Some(slug) = clean(input.slug) {
        m.slug = slug.to_lowercase();
    }
    m.summary = clean(input.summary);
    m.content = input.content;
    if let Some(featured) = input.featured {
        m.featured = featured;
    }
    let updated = news_article::update(db, m).await?;
    cache.invalidate_region(REGION_NEWS);
    Ok(updated)
}

#[instrument(skip(db, cache))]
pub async fn delete(db: &DatabaseConnection, cache: &AppCache, id: Uuid) -> Result<(), ServiceError> {
    let res = news_article::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("news article", id));
    }
    cache.invalidate_region(REGION_NEWS);
    Ok(())
}

#[instrument(skip(db, cache))]
pub async fn publish(db: &DatabaseConnection, cache: &AppCache, id: Uuid) -> Result<news_article::Model, ServiceError> {
    let mut m = find(db, id).await?;
    if m.status == NewsStatus::Published {
        return Ok(m);
    }
    m.status = NewsStatus::Published;
    m.published_at = Some(Utc::now().into());
    let updated = news_article::update(db, m).await?;
    cache.invalidate_region(REGION_NEWS);
    info!(article_id = %id, "news_published");
    Ok(updated)
}

/// `publish_at` must lie in the future; published or archived articles cannot be scheduled.
#[instrument(skip(db, cache))]
pub async fn schedule(db: &DatabaseConnection, cache: &AppCache, id: Uuid, publish_at: DateTime<Utc>) -> Result<news_article::Model, ServiceError> {
    if publish_at <= Utc::now() {
        return Err(ServiceError::Unprocessable("publish_at must be in the future".into()));
    }
    let mut m = find(db, id).await?;
    if matches!(m.status, NewsStatus::Published | NewsStatus::Archived) {
        return Err(ServiceError::Unprocessable(format!("cannot schedule an article in state {:?}", m.status)));
    }
    m.status = NewsStatus::Scheduled;
    m.publish_at = Some(publish_at.into());
    let updated = news_article::update(db, m).await?;
    cache.invalidate_region(REGION_NEWS);
    info!(article_id = %id, publish_at = %publish_at, "news_scheduled");
    Ok(updated)
}

#[instrument(skip(db, cache))]
pub async fn archive(db: &DatabaseConnection, cache: &AppCache, id: Uuid) -> Result<news_article::Model, ServiceError> {
    let mut m = find(db, id).await?;
    m.status = NewsStatus::Archived;
    let updated = news_article::update(db, m).await?;
    cache.invalidate_region(REGION_NEWS);
    Ok(updated)
}

/// Scheduled articles, soonest first.
pub async fn list_scheduled(db: &DatabaseConnection, pagination: Pagination) -> Result<Page<news_article::Model>, ServiceError> {
    let select = news_article::Entity::find()
        .filter(news_article::Column::Status.eq(NewsStatus::Scheduled))
        .order_by_asc(news_article::Column::PublishAt);
    Ok(fetch_page(db, select, pagination).await?)
}

/// Publishes every scheduled article whose `publish_at` is not after `now`. Returns their ids.
#[instrument(skip(db, cache))]
pub async fn publish_due(db: &DatabaseConnection, cache: &AppCache, now: DateTime<Utc>) -> Result<Vec<Uuid>, ServiceError> {
    let due = news_article::Entity::find()
        .filter(news_article::Column::Status.eq(NewsStatus::Scheduled))
        .filter(news_article::Column::PublishAt.lte(now))
        .all(db)
        .await?;
    let mut published = Vec::with_capacity(due.len());
    for mut m in due {
        m.status = NewsStatus::Published;
        m.published_at = Some(now.into());
        let id = m.id;
        news_article::update(db, m).await?;
        published.push(id);
    }
    if !published.is_empty() {
        cache.invalidate_region(REGION_NEWS);
        info!(count = published.len(), "scheduled_news_published");
    }
    Ok(published)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::memory_db;
    use chrono::Duration;
    use models::errors::ModelError;

    fn input(title: &str) -> NewsInput {
        NewsInput { title: title.into(), slug: None, summary: None, content: "Body".into(), featured: None }
    }

    #[tokio::test]
    async fn slugs_are_generated_and_deduplicated() -> anyhow::Result<()> {
        let db = memory_db().await;
        let cache = AppCache::disabled();
        let a = create(&db, &cache, None, input("Season Opener!")).await?;
        let b = create(&db, &cache, None, input("Season opener")).await?;
        let c = create(&db, &cache, None, input("season-opener")).await?;
        assert_eq!(a.slug, "season-opener");
        assert_eq!(b.slug, "season-opener-2");
        assert_eq!(c.slug, "season-opener-3");
        assert_eq!(a.status, NewsStatus::Draft);
        Ok(())
    }

    #[tokio::test]
    async fn explicit_duplicate_slug_conflicts() -> anyhow::Result<()> {
        let db = memory_db().await;
        let cache = AppCache::disabled();
        create(&db, &cache, None, input("Hello there")).await?;
        let mut dup = input("Other title");
        dup.slug = Some("hello-there".into());
        let err = create(&db, &cache, None, dup).await.unwrap_err();
        assert!(matches!(err, ServiceError::Model(ModelError::Conflict(_))));
        Ok(())
    }

    #[tokio::test]
    async fn public_views_hide_drafts() -> anyhow::Result<()> {
        let db = memory_db().await;
        let cache = AppCache::new(&configs::CacheConfig { enabled: true, ttl_secs: 60, max_capacity: 100 });
        let draft = create(&db, &cache, None, input("Draft piece")).await?;
        let live = create(&db, &cache, None, input("Live piece")).await?;
        publish(&db, &cache, live.id).await?;

        let public = list(&db, NewsFilter { status: Some(NewsStatus::Draft), ..Default::default() }, false, Pagination::default()).await?;
        assert_eq!(public.total_items, 1);
        assert_eq!(public.items[0].id, live.id);

        let editors = list(&db, NewsFilter { status: Some(NewsStatus::Draft), ..Default::default() }, true, Pagination::default()).await?;
        assert_eq!(editors.items[0].id, draft.id);

        assert!(matches!(get(&db, &cache, draft.id, false).await, Err(ServiceError::NotFound(_))));
        assert!(get(&db, &cache, draft.id, true).await.is_ok());
        assert!(get_by_slug(&db, &cache, "live-piece", false).await.is_ok());

        publish(&db, &cache, draft.id).await?;
        assert!(get(&db, &cache, draft.id, false).await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn schedule_rules_and_publish_due() -> anyhow::Result<()> {
        let db = memory_db().await;
        let cache = AppCache::disabled();
        let a = create(&db, &cache, None, input("Due soon")).await?;
        let b = create(&db, &cache, None, input("Due later")).await?;

        let past = schedule(&db, &cache, a.id, Utc::now() - Duration::minutes(1)).await;
        assert!(matches!(past, Err(ServiceError::Unprocessable(_))));

        let when = Utc::now() + Duration::minutes(5);
        schedule(&db, &cache, a.id, when).await?;
        schedule(&db, &cache, b.id, Utc::now() + Duration::days(2)).await?;
        assert_eq!(list_scheduled(&db, Pagination::default()).await?.items[0].id, a.id);

        assert!(publish_due(&db, &cache, Utc::now()).await?.is_empty());
        let published = publish_due(&db, &cache, when + Duration::seconds(1)).await?;
        assert_eq!(published, vec![a.id]);
        let a = find(&db, a.id).await?;
        assert_eq!(a.status, NewsStatus::Published);
        assert!(a.published_at.is_some());

        let again = schedule(&db, &cache, a.id, Utc::now() + Duration::days(1)).await;
        assert!(matches!(again, Err(ServiceError::Unprocessable(_))));

        archive(&db, &cache, b.id).await?;
        assert_eq!(list_scheduled(&db, Pagination::default()).await?.total_items, 0);
        Ok(())
    }
}

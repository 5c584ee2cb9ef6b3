use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use models::download;

use crate::errors::ServiceError;
use crate::pagination::{fetch_page, Page, Pagination};
use crate::services::clean;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadInput {
    pub title: String,
    pub description: Option<String>,
    pub file_url: String,
    pub category: Option<String>,
    pub file_size_bytes: Option<i64>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadFilter {
    pub category: Option<String>,
}

/// Result of registering a download.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DownloadHit {
    pub id: Uuid,
    pub file_url: String,
    pub download_count: i64,
}

pub async fn list(
    db: &DatabaseConnection,
    filter: DownloadFilter,
    include_inactive: bool,
    pagination: Pagination,
) -> Result<Page<download::Model>, ServiceError> {
    let mut select = download::Entity::find();
    if !include_inactive {
        select = select.filter(download::Column::Active.eq(true));
    }
    if let Some(category) = clean(filter.category) {
        select = select.filter(download::Column::Category.eq(category));
    }
    let select = select.order_by_asc(download::Column::Title);
    Ok(fetch_page(db, select, pagination).await?)
}

/// Inactive downloads are reported as missing unless `include_inactive`.
pub async fn get(db: &DatabaseConnection, id: Uuid, include_inactive: bool) -> Result<download::Model, ServiceError> {
    download::Entity::find_by_id(id)
        .one(db)
        .await?
        .filter(|d| include_inactive || d.active)
        .ok_or_else(|| ServiceError::not_found("download", id))
}

fn apply(mut m: download::Model, input: DownloadInput) -> download::Model {
    m.title = input.title.trim().to_string();
    m.description = clean(input.description);
    m.file_url = input.file_url.trim().to_string();
    m.category = clean(input.category);
    m.file_size_bytes = input.file_size_bytes;
    if let Some(active) = input.active {
        m.active = active;
    }
    m
}

#[instrument(skip(db, input), fields(title = %input.title))]
pub async fn create(db: &DatabaseConnection, input: DownloadInput) -> Result<download::Model, ServiceError> {
    let now = Utc::now().into();
    let blank = download::Model {
        id: Uuid::new_v4(),
        title: String::new(),
        description: None,
        file_url: String::new(),
        category: None,
        file_size_bytes: None,
        download_count: 0,
        active: true,
        created_at: now,
        updated_at: now,
    };
    let created = download::create(db, apply(blank, input)).await?;
    info!(download_id = %created.id, "download_created");
    Ok(created)
}

#[instrument(skip(db, input))]
pub async fn update(db: &DatabaseConnection, id: Uuid, input: DownloadInput) -> Result<download::Model, ServiceError> {
    let current = get(db, id, true).await?;
    Ok(download::update(db, apply(current, input)).await?)
}

#[instrument(skip(db))]
pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let res = download::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("download", id));
    }
    Ok(())
}

/// Atomically bumps `download_count` of an active download.
#[instrument(skip(db))]
pub async fn hit(db: &DatabaseConnection, id: Uuid) -> Result<DownloadHit, ServiceError> {
    let res = download::Entity::update_many()
        .col_expr(download::Column::DownloadCount, Expr::col(download::Column::DownloadCount).add(1))
        .filter(download::Column::Id.eq(id))
        .filter(download::Column::Active.eq(true))
        .exec(db)
        .await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("download", id));
    }
    let d = get(db, id, true).await?;
    debug!(download_id = %id, count = d.download_count, "download_hit");
    Ok(DownloadHit { id: d.id, file_url: d.file_url, download_count: d.download_count })
}

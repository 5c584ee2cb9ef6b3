use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::media_item::{self, MediaType};

use crate::errors::ServiceError;
use crate::pagination::{fetch_page, Page, Pagination};
use crate::services::clean;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInput {
    pub title: String,
    pub media_type: MediaType,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub description: Option<String>,
    pub tournament_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaFilter {
    pub media_type: Option<MediaType>,
    pub tournament_id: Option<Uuid>,
}

pub async fn list(db: &DatabaseConnection, filter: MediaFilter, pagination: Pagination) -> Result<Page<media_item::Model>, ServiceError> {
    let mut select = media_item::Entity::find();
    if let Some(t) = filter.media_type {
        select = select.filter(media_item::Column::MediaType.eq(t));
    }
    if let Some(tid) = filter.tournament_id {
        select = select.filter(media_item::Column::TournamentId.eq(tid));
    }
    let select = select.order_by_desc(media_item::Column::CreatedAt);
    Ok(fetch_page(db, select, pagination).await?)
}

pub async fn get(db: &DatabaseConnection, id: Uuid) -> Result<media_item::Model, ServiceError> {
    media_item::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("media item", id))
}

async fn ensure_tournament(db: &DatabaseConnection, id: Option<Uuid>) -> Result<(), ServiceError> {
    if let Some(id) = id {
        models::tournament::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::Validation(format!("tournament {id} does not exist")))?;
    }
    Ok(())
}

fn apply(mut m: media_item::Model, input: MediaInput) -> media_item::Model {
    m.title = input.title.trim().to_string();
    m.media_type = input.media_type;
    m.url = input.url.trim().to_string();
    m.thumbnail_url = clean(input.thumbnail_url);
    m.description = clean(input.description);
    m.tournament_id = input.tournament_id;
    m
}

#[instrument(skip(db, input), fields(title = %input.title))]
pub async fn create(db: &DatabaseConnection, uploaded_by: Option<Uuid>, input: MediaInput) -> Result<media_item::Model, ServiceError> {
    ensure_tournament(db, input.tournament_id).await?;
    let now = Utc::now().into();
    let blank = media_item::Model {
        id: Uuid::new_v4(),
        title: String::new(),
        media_type: input.media_type,
        url: String::new(),
        thumbnail_url: None,
        description: None,
        tournament_id: None,
        uploaded_by,
        created_at: now,
        updated_at: now,
    };
    let created = media_item::create(db, apply(blank, input)).await?;
    info!(media_id = %created.id, "media_created");
    Ok(created)
}

#[instrument(skip(db, input))]
pub async fn update(db: &DatabaseConnection, id: Uuid, input: MediaInput) -> Result<media_item::Model, ServiceError> {
    ensure_tournament(db, input.tournament_id).await?;
    let current = get(db, id).await?;
    Ok(media_item::update(db, apply(current, input)).await?)
}

#[instrument(skip(db))]
pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let res = media_item::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("media item", id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::memory_db;

    fn photo(title: &str) -> MediaInput {
        MediaInput {
            title: title.into(),
            media_type: MediaType::Photo,
            url: "https://cdn.example.org/p.jpg".into(),
            thumbnail_url: Some("  ".into()),
            description: None,
            tournament_id: None,
        }
    }

    #[tokio::test]
    async fn filter_by_type_and_reject_unknown_tournament() -> anyhow::Result<()> {
        let db = memory_db().await;
        let uploader = None;
        let p = create(&db, uploader, photo("Final")).await?;
        assert_eq!(p.thumbnail_url, None);
        let mut video = photo("Highlights");
        video.media_type = MediaType::Video;
        create(&db, uploader, video).await?;

        let photos = list(&db, MediaFilter { media_type: Some(MediaType::Photo), ..Default::default() }, Pagination::default()).await?;
        assert_eq!(photos.total_items, 1);
        assert_eq!(photos.items[0].id, p.id);

        let mut orphan = photo("Nowhere");
        orphan.tournament_id = Some(Uuid::new_v4());
        assert!(matches!(create(&db, uploader, orphan).await, Err(ServiceError::Validation(_))));

        delete(&db, p.id).await?;
        assert!(matches!(get(&db, p.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }
}

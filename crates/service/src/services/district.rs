use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::{district, player, tournament};

use crate::cache::{AppCache, REGION_DISTRICTS};
use crate::errors::ServiceError;
use crate::pagination::{fetch_page, Page, Pagination};
use crate::services::clean;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistrictInput {
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub contact_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DistrictDetail {
    #[serde(flatten)]
    pub district: district::Model,
    pub player_count: u64,
    pub tournament_count: u64,
}

pub async fn list(db: &DatabaseConnection, pagination: Pagination) -> Result<Page<district::Model>, ServiceError> {
    let select = district::Entity::find().order_by_asc(district::Column::Name);
    Ok(fetch_page(db, select, pagination).await?)
}

/// The district row is cached; player and tournament counts are always live.
pub async fn get(db: &DatabaseConnection, cache: &AppCache, id: Uuid) -> Result<DistrictDetail, ServiceError> {
    let district = cache.get_or_try_insert(REGION_DISTRICTS, &id.to_string(), || find(db, id)).await?;
    let player_count = player::Entity::find()
        .filter(player::Column::DistrictId.eq(id))
        .count(db)
        .await?;
    let tournament_count = tournament::Entity::find()
        .filter(tournament::Column::DistrictId.eq(id))
        .count(db)
        .await?;
    Ok(DistrictDetail { district, player_count, tournament_count })
}

pub async fn find(db: &DatabaseConnection, id: Uuid) -> Result<district::Model, ServiceError> {
    district::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("district", id))
}

/// Fails with 404 semantics when `id` is set but unknown.
pub async fn ensure_exists(db: &DatabaseConnection, id: Option<Uuid>) -> Result<(), ServiceError> {
    if let Some(id) = id {
        find(db, id).await?;
    }
    Ok(())
}

#[instrument(skip(db, cache, input), fields(code = %input.code))]
pub async fn create(db: &DatabaseConnection, cache: &AppCache, input: DistrictInput) -> Result<district::Model, ServiceError> {
    let created = district::create(db, apply(blank(Uuid::new_v4()), input)).await?;
    cache.invalidate_region(REGION_DISTRICTS);
    info!(district_id = %created.id, "district_created");
    Ok(created)
}

#[instrument(skip(db, cache, input))]
pub async fn update(db: &DatabaseConnection, cache: &AppCache, id: Uuid, input: DistrictInput) -> Result<district::Model, ServiceError> {
    let existing = find(db, id).await?;
    let updated = district::update(db, apply(existing, input)).await?;
    cache.invalidate_region(REGION_DISTRICTS);
    Ok(updated)
}

#[instrument(skip(db, cache))]
pub async fn delete(db: &DatabaseConnection, cache: &AppCache, id: Uuid) -> Result<(), ServiceError> {
    let res = district::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("district", id));
    }
    cache.invalidate_region(REGION_DISTRICTS);
    cache.invalidate_region(crate::cache::REGION_PLAYERS);
    cache.invalidate_region(crate::cache::REGION_TOURNAMENTS);
    info!(district_id = %id, "district_deleted");
    Ok(())
}

fn blank(id: Uuid) -> district::Model {
    let now = chrono::Utc::now().into();
    district::Model {
        id,
        name: String::new(),
        code: String::new(),
        description: None,
        contact_email: None,
        created_at: now,
        updated_at: now,
    }
}

fn apply(mut m: district::Model, input: DistrictInput) -> district::Model {
    m.name = input.name.trim().to_string();
    m.code = input.code.trim().to_ascii_uppercase();
    m.description = clean(input.description);
    m.contact_email = clean(input.contact_email).map(|e| e.to_lowercase());
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::player::{self as players, PlayerInput};
    use crate::test_support::memory_db;

    fn north() -> DistrictInput {
        DistrictInput { name: "North".into(), code: "nor".into(), description: None, contact_email: None }
    }

    fn player_in(district_id: Uuid) -> PlayerInput {
        PlayerInput {
            first_name: "Ida".into(),
            last_name: "Moe".into(),
            date_of_birth: None,
            gender: None,
            district_id: Some(district_id),
            ranking: None,
            rating: None,
            bio: None,
            photo_url: None,
            active: None,
        }
    }

    #[tokio::test]
    async fn counts_follow_player_writes_with_cache_enabled() -> anyhow::Result<()> {
        let db = memory_db().await;
        let cache = AppCache::new(&configs::CacheConfig::default());
        assert!(cache.is_enabled());
        let d = create(&db, &cache, north()).await?;
        assert_eq!(d.code, "NOR");
        assert_eq!(get(&db, &cache, d.id).await?.player_count, 0);

        let p = players::create(&db, &cache, player_in(d.id)).await?;
        assert_eq!(get(&db, &cache, d.id).await?.player_count, 1);

        players::delete(&db, &cache, p.id).await?;
        assert_eq!(get(&db, &cache, d.id).await?.player_count, 0);
        Ok(())
    }

    #[tokio::test]
    async fn renamed_district_is_not_served_stale() -> anyhow::Result<()> {
        let db = memory_db().await;
        let cache = AppCache::new(&configs::CacheConfig::default());
        let d = create(&db, &cache, north()).await?;
        get(&db, &cache, d.id).await?;
        let mut input = north();
        input.name = "Northern".into();
        update(&db, &cache, d.id, input).await?;
        assert_eq!(get(&db, &cache, d.id).await?.district.name, "Northern");
        Ok(())
    }
}

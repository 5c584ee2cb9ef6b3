use chrono::{NaiveDate, Utc};
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::{achievement, player};

use crate::cache::{AppCache, REGION_PLAYERS};
use crate::errors::ServiceError;
use crate::pagination::{fetch_page, Page, Pagination};
use crate::services::{clean, district};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInput {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub district_id: Option<Uuid>,
    pub ranking: Option<i32>,
    pub rating: Option<i32>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    /// Defaults to `true` on create.
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerFilter {
    pub district_id: Option<Uuid>,
    pub active: Option<bool>,
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementInput {
    pub title: String,
    pub description: Option<String>,
    pub achieved_on: NaiveDate,
    pub tournament_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerDetail {
    #[serde(flatten)]
    pub player: player::Model,
    pub achievements: Vec<achievement::Model>,
}

pub async fn list(db: &DatabaseConnection, filter: PlayerFilter, pagination: Pagination) -> Result<Page<player::Model>, ServiceError> {
    let mut select = player::Entity::find();
    if let Some(district_id) = filter.district_id {
        select = select.filter(player::Column::DistrictId.eq(district_id));
    }
    if let Some(active) = filter.active {
        select = select.filter(player::Column::Active.eq(active));
    }
    if let Some(q) = clean(filter.q) {
        select = select.filter(
            Condition::any()
                .add(player::Column::FirstName.contains(&q))
                .add(player::Column::LastName.contains(&q)),
        );
    }
    let select = select.order_by_asc(player::Column::LastName).order_by_asc(player::Column::FirstName);
    Ok(fetch_page(db, select, pagination).await?)
}

pub async fn find(db: &DatabaseConnection, id: Uuid) -> Result<player::Model, ServiceError> {
    player::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("player", id))
}

/// Player with achievements, newest first.
pub async fn get(db: &DatabaseConnection, cache: &AppCache, id: Uuid) -> Result<PlayerDetail, ServiceError> {
    cache
        .get_or_try_insert(REGION_PLAYERS, &id.to_string(), || async move {
            let player = find(db, id).await?;
            let achievements = player
                .find_related(achievement::Entity)
                .order_by_desc(achievement::Column::AchievedOn)
                .all(db)
                .await?;
            Ok(PlayerDetail { player, achievements })
        })
        .await
}

#[instrument(skip(db, cache, input))]
pub async fn create(db: &DatabaseConnection, cache: &AppCache, input: PlayerInput) -> Result<player::Model, ServiceError> {
    district::ensure_exists(db, input.district_id).await?;
    let now = Utc::now().into();
    let blank = player::Model {
        id: Uuid::new_v4(),
        first_name: String::new(),
        last_name: String::new(),
        date_of_birth: None,
        gender: None,
        district_id: None,
        ranking: None,
        rating: None,
        bio: None,
        photo_url: None,
        active: true,
        created_at: now,
        updated_at: now,
    };
    let created = player::create(db, apply(blank, input)).await?;
    cache.invalidate_region(REGION_PLAYERS);
    info!(player_id = %created.id, "player_created");
    Ok(created)
}

#[instrument(skip(db, cache, input))]
pub async fn update(db: &DatabaseConnection, cache: &AppCache, id: Uuid, input: PlayerInput) -> Result<player::Model, ServiceError> {
    let existing = find(db, id).await?;
    district::ensure_exists(db, input.district_id).await?;
    let updated = player::update(db, apply(existing, input)).await?;
    cache.invalidate_region(REGION_PLAYERS);
    Ok(updated)
}

#[instrument(skip(db, cache))]
pub async fn delete(db: &DatabaseConnection, cache: &AppCache, id: Uuid) -> Result<(), ServiceError> {
    let res = player::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("player", id));
    }
    cache.invalidate_region(REGION_PLAYERS);
    info!(player_id = %id, "player_deleted");
    Ok(())
}

pub async fn list_achievements(db: &DatabaseConnection, player_id: Uuid) -> Result<Vec<achievement::Model>, ServiceError> {
    let player = find(db, player_id).await?;
    Ok(player
        .find_related(achievement::Entity)
        .order_by_desc(achievement::Column::AchievedOn)
        .all(db)
        .await?)
}

#[instrument(skip(db, cache, input))]
pub async fn add_achievement(
    db: &DatabaseConnection,
    cache: &AppCache,
    player_id: Uuid,
    input: AchievementInput,
) -> Result<achievement::Model, ServiceError> {
    find(db, player_id).await?;
    if let Some(tid) = input.tournament_id {
        crate::services::tournament::find(db, tid).await?;
    }
    let now = Utc::now().into();
    let created = achievement::create(
        db,
        achievement::Model {
            id: Uuid::new_v4(),
            player_id,
            tournament_id: input.tournament_id,
            title: input.title.trim().to_string(),
            description: clean(input.description),
            achieved_on: input.achieved_on,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;
    cache.invalidate_region(REGION_PLAYERS);
    Ok(created)
}

pub async fn delete_achievement(db: &DatabaseConnection, cache: &AppCache, player_id: Uuid, achievement_id: Uuid) -> Result<(), ServiceError> {
    let res = achievement::Entity::delete_many()
        .filter(achievement::Column::Id.eq(achievement_id))
        .filter(achievement::Column::PlayerId.eq(player_id))
        .exec(db)
        .await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("achievement", achievement_id));
    }
    cache.invalidate_region(REGION_PLAYERS);
    Ok(())
}

fn apply(mut m: player::Model, input: PlayerInput) -> player::Model {
    m.first_name = input.first_name.trim().to_string();
    m.last_name = input.last_name.trim().to_string();
    m.date_of_birth = input.date_of_birth;
    m.gender = clean(input.gender);
    m.district_id = input.district_id;
    m.ranking = input.ranking;
    m.rating = input.rating;
    m.bio = clean(input.bio);
    m.photo_url = clean(input.photo_url);
    if let Some(active) = input.active {
        m.active = active;
    }
    m
}

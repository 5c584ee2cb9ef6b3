use chrono::{NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::validation::Validator;
use crate::{achievement, district};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "player")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub district_id: Option<Uuid>,
    pub ranking: Option<i32>,
    pub rating: Option<i32>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    District,
    Achievement,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::District => Entity::belongs_to(district::Entity)
                .from(Column::DistrictId)
                .to(district::Column::Id)
                .into(),
            Relation::Achievement => Entity::has_many(achievement::Entity).into(),
        }
    }
}

impl Related<district::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::District.def()
    }
}

impl Related<achievement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Achievement.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

pub fn validate(m: &Model) -> Result<(), ModelError> {
    let today = Utc::now().date_naive();
    Validator::new()
        .text("first_name", &m.first_name, 1, 100)
        .text("last_name", &m.last_name, 1, 100)
        .optional_text("gender", m.gender.as_deref(), 16)
        .optional_url("photo_url", m.photo_url.as_deref())
        .check(
            m.date_of_birth.map_or(true, |dob| dob <= today),
            "date_of_birth",
            "must not be in the future",
        )
        .check(m.ranking.map_or(true, |r| r >= 1), "ranking", "must be positive")
        .check(m.rating.map_or(true, |r| r >= 0), "rating", "must not be negative")
        .finish()
}

pub async fn create<C: ConnectionTrait>(db: &C, mut m: Model) -> Result<Model, ModelError> {
    let now = Utc::now().into();
    m.created_at = now;
    m.updated_at = now;
    validate(&m)?;
    Ok(ActiveModel::from(m).reset_all().insert(db).await?)
}

pub async fn update<C: ConnectionTrait>(db: &C, mut m: Model) -> Result<Model, ModelError> {
    m.updated_at = Utc::now().into();
    validate(&m)?;
    Ok(ActiveModel::from(m).reset_all().update(db).await?)
}

use chrono::{NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::validation::Validator;
use crate::{district, tournament_registration};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TournamentStatus {
    #[sea_orm(string_value = "UPCOMING")]
    Upcoming,
    #[sea_orm(string_value = "REGISTRATION_OPEN")]
    RegistrationOpen,
    #[sea_orm(string_value = "ONGOING")]
    Ongoing,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tournament")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub venue: Option<String>,
    pub district_id: Option<Uuid>,
    pub category: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub registration_deadline: Option<NaiveDate>,
    pub max_participants: Option<i32>,
    pub status: TournamentStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    District,
    Registration,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::District => Entity::belongs_to(district::Entity)
                .from(Column::DistrictId)
                .to(district::Column::Id)
                .into(),
            Relation::Registration => Entity::has_many(tournament_registration::Entity).into(),
        }
    }
}

impl Related<district::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::District.def()
    }
}

impl Related<tournament_registration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Registration.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Open for registrations on `today`: status allows it and the deadline has not passed.
    pub fn accepts_registrations(&self, today: NaiveDate) -> bool {
        matches!(self.status, TournamentStatus::Upcoming | TournamentStatus::RegistrationOpen)
            && self.registration_deadline.map_or(today <= self.start_date, |d| today <= d)
    }
}

pub fn validate(m: &Model) -> Result<(), ModelError> {
    Validator::new()
        .text("name", &m.name, 3, 200)
        .optional_text("venue", m.venue.as_deref(), 200)
        .optional_text("category", m.category.as_deref(), 64)
        .check(m.end_date >= m.start_date, "end_date", "must not be before start_date")
        .check(
            m.registration_deadline.map_or(true, |d| d <= m.start_date),
            "registration_deadline",
            "must not be after start_date",
        )
        .check(
            m.max_participants.map_or(true, |n| n >= 2),
            "max_participants",
            "must be at least 2",
        )
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

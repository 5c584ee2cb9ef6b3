use chrono::{NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::validation::Validator;
use crate::{player, tournament};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "achievement")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub player_id: Uuid,
    pub tournament_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub achieved_on: NaiveDate,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Player,
    Tournament,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Player => Entity::belongs_to(player::Entity)
                .from(Column::PlayerId)
                .to(player::Column::Id)
                .into(),
            Relation::Tournament => Entity::belongs_to(tournament::Entity)
                .from(Column::TournamentId)
                .to(tournament::Column::Id)
                .into(),
        }
    }
}

impl Related<player::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Player.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate(m: &Model) -> Result<(), ModelError> {
    Validator::new()
        .text("title", &m.title, 1, 200)
        .check(
            m.achieved_on <= Utc::now().date_naive(),
            "achieved_on",
            "must not be in the future",
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

use chrono::Utc;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::validation::Validator;
use crate::{player, tournament};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tournament_registration")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub player_id: Uuid,
    pub seed: Option<i32>,
    pub registered_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Tournament,
    Player,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Tournament => Entity::belongs_to(tournament::Entity)
                .from(Column::TournamentId)
                .to(tournament::Column::Id)
                .into(),
            Relation::Player => Entity::belongs_to(player::Entity)
                .from(Column::PlayerId)
                .to(player::Column::Id)
                .into(),
        }
    }
}

impl Related<tournament::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tournament.def()
    }
}

impl Related<player::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Player.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create<C: ConnectionTrait>(db: &C, mut m: Model) -> Result<Model, ModelError> {
    m.registered_at = Utc::now().into();
    Validator::new()
        .check(m.seed.map_or(true, |s| s >= 1), "seed", "must be positive")
        .finish()?;
    Ok(ActiveModel::from(m).reset_all().insert(db).await?)
}

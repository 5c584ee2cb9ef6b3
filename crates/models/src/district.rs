use chrono::Utc;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::validation::Validator;
use crate::{player, tournament};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "district")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub contact_email: Option<String>,
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
            Relation::Player => Entity::has_many(player::Entity).into(),
            Relation::Tournament => Entity::has_many(tournament::Entity).into(),
        }
    }
}

impl Related<player::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Player.def()
    }
}

impl Related<tournament::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tournament.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate(m: &Model) -> Result<(), ModelError> {
    Validator::new()
        .text("name", &m.name, 2, 100)
        .text("code", &m.code, 2, 10)
        .check(
            m.code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
            "code",
            "must contain only upper-case letters and digits",
        )
        .optional_email("contact_email", m.contact_email.as_deref())
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

use chrono::Utc;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::validation::Validator;
use crate::{tournament, user};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    #[sea_orm(string_value = "PHOTO")]
    Photo,
    #[sea_orm(string_value = "VIDEO")]
    Video,
    #[sea_orm(string_value = "DOCUMENT")]
    Document,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "media_item")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub media_type: MediaType,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub description: Option<String>,
    pub tournament_id: Option<Uuid>,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Tournament,
    Uploader,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Tournament => Entity::belongs_to(tournament::Entity)
                .from(Column::TournamentId)
                .to(tournament::Column::Id)
                .into(),
            Relation::Uploader => Entity::belongs_to(user::Entity)
                .from(Column::UploadedBy)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate(m: &Model) -> Result<(), ModelError> {
    Validator::new()
        .text("title", &m.title, 1, 200)
        .url("url", &m.url)
        .optional_url("thumbnail_url", m.thumbnail_url.as_deref())
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

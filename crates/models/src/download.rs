use chrono::Utc;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::validation::Validator;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "download")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub file_url: String,
    pub category: Option<String>,
    pub file_size_bytes: Option<i64>,
    pub download_count: i64,
    pub active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate(m: &Model) -> Result<(), ModelError> {
    Validator::new()
        .text("title", &m.title, 1, 200)
        .url("file_url", &m.file_url)
        .optional_text("category", m.category.as_deref(), 64)
        .check(m.file_size_bytes.map_or(true, |s| s >= 0), "file_size_bytes", "must not be negative")
        .check(m.download_count >= 0, "download_count", "must not be negative")
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

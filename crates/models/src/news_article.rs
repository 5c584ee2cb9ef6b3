use chrono::Utc;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::user;
use crate::validation::Validator;

pub const SLUG_MAX_LEN: usize = 220;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NewsStatus {
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    #[sea_orm(string_value = "SCHEDULED")]
    Scheduled,
    #[sea_orm(string_value = "PUBLISHED")]
    Published,
    #[sea_orm(string_value = "ARCHIVED")]
    Archived,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "news_article")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub content: String,
    pub author_id: Option<Uuid>,
    pub status: NewsStatus,
    pub featured: bool,
    pub publish_at: Option<DateTimeWithTimeZone>,
    pub published_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Author,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Author => Entity::belongs_to(user::Entity)
                .from(Column::AuthorId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Lower-case ASCII words joined by single dashes.
///
/// ```
/// assert_eq!(models::news_article::slugify("  Spring Open: Day 2!  "), "spring-open-day-2");
/// ```
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.len() > SLUG_MAX_LEN - 8 {
        slug.truncate(SLUG_MAX_LEN - 8);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    slug
}

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= SLUG_MAX_LEN
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

pub fn validate(m: &Model) -> Result<(), ModelError> {
    Validator::new()
        .text("title", &m.title, 3, 200)
        .check(
            is_valid_slug(&m.slug),
            "slug",
            "must be lower-case letters, digits and single dashes",
        )
        .optional_text("summary", m.summary.as_deref(), 500)
        .text("content", &m.content, 1, usize::MAX)
        .check(
            m.status != NewsStatus::Scheduled || m.publish_at.is_some(),
            "publish_at",
            "is required for scheduled articles",
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

use chrono::{NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::district;
use crate::errors::ModelError;
use crate::validation::Validator;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipType {
    #[sea_orm(string_value = "REGULAR")]
    Regular,
    #[sea_orm(string_value = "LIFE")]
    Life,
    #[sea_orm(string_value = "HONORARY")]
    Honorary,
    #[sea_orm(string_value = "JUNIOR")]
    Junior,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberStatus {
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "INACTIVE")]
    Inactive,
    #[sea_orm(string_value = "SUSPENDED")]
    Suspended,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "member")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub membership_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub district_id: Option<Uuid>,
    pub membership_type: MembershipType,
    pub status: MemberStatus,
    pub joined_on: NaiveDate,
    pub expires_on: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    District,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::District => Entity::belongs_to(district::Entity)
                .from(Column::DistrictId)
                .to(district::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate(m: &Model) -> Result<(), ModelError> {
    Validator::new()
        .text("membership_number", &m.membership_number, 1, 32)
        .text("first_name", &m.first_name, 1, 100)
        .text("last_name", &m.last_name, 1, 100)
        .email("email", &m.email)
        .optional_text("phone", m.phone.as_deref(), 32)
        .check(
            m.expires_on.map_or(true, |exp| exp >= m.joined_on),
            "expires_on",
            "must not be before joined_on",
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

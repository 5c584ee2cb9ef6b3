use chrono::{NaiveDate, Utc};
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::member::{self, MemberStatus, MembershipType};

use crate::errors::ServiceError;
use crate::pagination::{fetch_page, Page, Pagination};
use crate::services::{clean, district};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberInput {
    pub membership_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub district_id: Option<Uuid>,
    pub membership_type: Option<MembershipType>,
    pub status: Option<MemberStatus>,
    /// Defaults to today.
    pub joined_on: Option<NaiveDate>,
    pub expires_on: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberFilter {
    pub status: Option<MemberStatus>,
    pub membership_type: Option<MembershipType>,
    /// Matches first name, last name or email.
    pub q: Option<String>,
}

pub async fn list(db: &DatabaseConnection, filter: MemberFilter, pagination: Pagination) -> Result<Page<member::Model>, ServiceError> {
    let mut select = member::Entity::find();
    if let Some(status) = filter.status {
        select = select.filter(member::Column::Status.eq(status));
    }
    if let Some(kind) = filter.membership_type {
        select = select.filter(member::Column::MembershipType.eq(kind));
    }
    if let Some(q) = clean(filter.q) {
        select = select.filter(
            Condition::any()
                .add(member::Column::FirstName.contains(&q))
                .add(member::Column::LastName.contains(&q))
                .add(member::Column::Email.contains(q.to_lowercase())),
        );
    }
    let select = select.order_by_asc(member::Column::LastName).order_by_asc(member::Column::FirstName);
    Ok(fetch_page(db, select, pagination).await?)
}

pub async fn get(db: &DatabaseConnection, id: Uuid) -> Result<member::Model, ServiceError> {
    member::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("member", id))
}

#[instrument(skip(db, input), fields(membership_number = %input.membership_number))]
pub async fn create(db: &DatabaseConnection, input: MemberInput) -> Result<member::Model, ServiceError> {
    district::ensure_exists(db, input.district_id).await?;
    let now = Utc::now().into();
    let blank = member::Model {
        id: Uuid::new_v4(),
        membership_number: String::new(),
        first_name: String::new(),
        last_name: String::new(),
        email: String::new(),
        phone: None,
        district_id: None,
        membership_type: MembershipType::Regular,
        status: MemberStatus::Active,
        joined_on: Utc::now().date_naive(),
        expires_on: None,
        notes: None,
        created_at: now,
        updated_at: now,
    };
    let created = member::create(db, apply(blank, input)).await?;
    info!(member_id = %created.id, "member_created");
    Ok(created)
}

#[instrument(skip(db, input))]
pub async fn update(db: &DatabaseConnection, id: Uuid, input: MemberInput) -> Result<member::Model, ServiceError> {
    let existing = get(db, id).await?;
    district::ensure_exists(db, input.district_id).await?;
    Ok(member::update(db, apply(existing, input)).await?)
}

#[instrument(skip(db))]
pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let res = member::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("member", id));
    }
    info!(member_id = %id, "member_deleted");
    Ok(())
}

fn apply(mut m: member::Model, input: MemberInput) -> member::Model {
    m.membership_number = input.membership_number.trim().to_string();
    m.first_name = input.first_name.trim().to_string();
    m.last_name = input.last_name.trim().to_string();
    m.email = input.email.trim().to_lowercase();
    m.phone = clean(input.phone);
    m.district_id = input.district_id;
    if let Some(kind) = input.membership_type {
        m.membership_type = kind;
    }
    if let Some(status) = input.status {
        m.status = status;
    }
    if let Some(joined) = input.joined_on {
        m.joined_on = joined;
    }
    m.expires_on = input.expires_on;
    m.notes = clean(input.notes);
    m
}

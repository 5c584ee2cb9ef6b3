use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::user;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_role")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    User,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn roles_for<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<Vec<String>, ModelError> {
    let rows = Entity::find()
        .filter(Column::UserId.eq(user_id))
        .order_by_asc(Column::Role)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|r| r.role).collect())
}

/// Replaces the user's role set. Run inside a transaction.
pub async fn replace_roles<C: ConnectionTrait>(db: &C, user_id: Uuid, roles: &[String]) -> Result<(), ModelError> {
    if roles.iter().any(|r| r.trim().is_empty()) {
        return Err(ModelError::Validation("role name required".into()));
    }
    Entity::delete_many().filter(Column::UserId.eq(user_id)).exec(db).await?;
    let now: DateTimeWithTimeZone = Utc::now().into();
    let mut seen = std::collections::BTreeSet::new();
    for role in roles {
        if !seen.insert(role.as_str()) {
            continue;
        }
        ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            role: Set(role.clone()),
            created_at: Set(now),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

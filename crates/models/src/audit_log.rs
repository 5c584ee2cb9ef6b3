use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub username: Option<String>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub http_method: String,
    pub path: String,
    pub status_code: i32,
    pub success: bool,
    pub duration_ms: i64,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub const PATH_MAX_LEN: usize = 512;
pub const USER_AGENT_MAX_LEN: usize = 512;

/// Inserts a row, clipping free-form columns to their storage width.
pub async fn create<C: ConnectionTrait>(db: &C, mut m: Model) -> Result<Model, ModelError> {
    m.path = clip(&m.path, PATH_MAX_LEN);
    m.user_agent = m.user_agent.map(|ua| clip(&ua, USER_AGENT_MAX_LEN));
    m.resource_id = m.resource_id.map(|id| clip(&id, 64));
    m.client_ip = m.client_ip.map(|ip| clip(&ip, 64));
    Ok(ActiveModel::from(m).reset_all().insert(db).await?)
}

fn clip(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

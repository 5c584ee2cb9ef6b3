//! Batch operations on members and players.
//!
//! Import processes items independently and reports a result per item. The
//! id-based operations run as single statements and report affected rows.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use models::errors::{FieldError, ModelError};
use models::member::{self, MemberStatus};
use models::player;

use crate::cache::{AppCache, REGION_PLAYERS};
use crate::errors::ServiceError;
use crate::services::member::{self as member_service, MemberInput};

pub const MAX_BATCH: usize = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct IdsInput {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusInput {
    pub ids: Vec<Uuid>,
    pub status: MemberStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemResult {
    pub index: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub field_errors: Vec<FieldError>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<ItemResult>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BulkOutcome {
    pub requested: usize,
    pub affected: u64,
}

fn check_batch(len: usize) -> Result<(), ServiceError> {
    if len == 0 {
        return Err(ServiceError::Validation("batch must not be empty".into()));
    }
    if len > MAX_BATCH {
        return Err(ServiceError::Validation(format!("batch of {len} exceeds the limit of {MAX_BATCH}")));
    }
    Ok(())
}

fn failure(index: usize, err: ServiceError) -> ItemResult {
    let field_errors = match &err {
        ServiceError::Invalid(errors) | ServiceError::Model(ModelError::Invalid(errors)) => errors.clone(),
        _ => Vec::new(),
    };
    ItemResult { index, success: false, id: None, error: Some(err.to_string()), field_errors }
}

/// Creates each member independently; one failure does not abort the batch.
#[instrument(skip(db, items), fields(count = items.len()))]
pub async fn import_members(db: &DatabaseConnection, items: Vec<MemberInput>) -> Result<ImportReport, ServiceError> {
    check_batch(items.len())?;
    let total = items.len();
    let mut results = Vec::with_capacity(total);
    for (index, item) in items.into_iter().enumerate() {
        match member_service::create(db, item).await {
            Ok(m) => results.push(ItemResult { index, success: true, id: Some(m.id), error: None, field_errors: Vec::new() }),
            Err(e) => {
                warn!(index, error = %e, "bulk_import_item_failed");
                results.push(failure(index, e));
            }
        }
    }
    let succeeded = results.iter().filter(|r| r.success).count();
    info!(total, succeeded, "bulk_import_members");
    Ok(ImportReport { total, succeeded, failed: total - succeeded, results })
}

#[instrument(skip(db, input), fields(count = input.ids.len(), status = ?input.status))]
pub async fn update_member_status(db: &DatabaseConnection, input: StatusInput) -> Result<BulkOutcome, ServiceError> {
    check_batch(input.ids.len())?;
    let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
    let res = member::Entity::update_many()
        .col_expr(member::Column::Status, Expr::value(input.status))
        .col_expr(member::Column::UpdatedAt, Expr::value(now))
        .filter(member::Column::Id.is_in(input.ids.clone()))
        .exec(db)
        .await?;
    Ok(BulkOutcome { requested: input.ids.len(), affected: res.rows_affected })
}

#[instrument(skip(db, input), fields(count = input.ids.len()))]
pub async fn delete_members(db: &DatabaseConnection, input: IdsInput) -> Result<BulkOutcome, ServiceError> {
    check_batch(input.ids.len())?;
    let res = member::Entity::delete_many()
        .filter(member::Column::Id.is_in(input.ids.clone()))
        .exec(db)
        .await?;
    info!(deleted = res.rows_affected, "bulk_delete_members");
    Ok(BulkOutcome { requested: input.ids.len(), affected: res.rows_affected })
}

#[instrument(skip(db, cache, input), fields(count = input.ids.len()))]
pub async fn deactivate_players(db: &DatabaseConnection, cache: &AppCache, input: IdsInput) -> Result<BulkOutcome, ServiceError> {
    check_batch(input.ids.len())?;
    let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
    let res = player::Entity::update_many()
        .col_expr(player::Column::Active, Expr::value(false))
        .col_expr(player::Column::UpdatedAt, Expr::value(now))
        .filter(player::Column::Id.is_in(input.ids.clone()))
        .exec(db)
        .await?;
    cache.invalidate_region(REGION_PLAYERS);
    Ok(BulkOutcome { requested: input.ids.len(), affected: res.rows_affected })
}

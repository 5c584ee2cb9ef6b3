use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use models::audit_log;
use serde::Deserialize;
use service::authz::Permission;
use service::pagination::{Page, Pagination};
use service::services::audit::{self, AuditFilter, PurgeResult};

use crate::errors::ApiError;
use crate::extract::{ApiQuery, CurrentUser};
use crate::state::ServerState;

#[derive(Debug, Deserialize)]
pub struct PurgeQuery {
    pub older_than_days: u32,
}

pub fn router() -> Router<ServerState> {
    Router::new().route("/admin/audit-logs", get(list).delete(purge))
}

async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiQuery(filter): ApiQuery<AuditFilter>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Page<audit_log::Model>>, ApiError> {
    user.require(Permission::AuditRead)?;
    Ok(Json(audit::query(&state.db, filter, page).await?))
}

async fn purge(State(state): State<ServerState>, user: CurrentUser, ApiQuery(q): ApiQuery<PurgeQuery>) -> Result<Json<PurgeResult>, ApiError> {
    user.require(Permission::SystemManage)?;
    Ok(Json(audit::purge_older_than(&state.db, q.older_than_days).await?))
}

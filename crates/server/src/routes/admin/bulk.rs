use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use service::authz::Permission;
use service::services::bulk::{self, BulkOutcome, IdsInput, ImportReport, StatusInput};
use service::services::member::MemberInput;

use crate::errors::ApiError;
use crate::extract::{ApiJson, CurrentUser};
use crate::state::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/admin/bulk/members/import", post(import_members))
        .route("/admin/bulk/members/status", post(member_status))
        .route("/admin/bulk/members/delete", post(delete_members))
        .route("/admin/bulk/players/deactivate", post(deactivate_players))
}

async fn import_members(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiJson(items): ApiJson<Vec<MemberInput>>,
) -> Result<Json<ImportReport>, ApiError> {
    user.require(Permission::BulkOperations)?;
    Ok(Json(bulk::import_members(&state.db, items).await?))
}

async fn member_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<StatusInput>,
) -> Result<Json<BulkOutcome>, ApiError> {
    user.require(Permission::BulkOperations)?;
    Ok(Json(bulk::update_member_status(&state.db, input).await?))
}

async fn delete_members(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<IdsInput>,
) -> Result<Json<BulkOutcome>, ApiError> {
    user.require(Permission::BulkOperations)?;
    Ok(Json(bulk::delete_members(&state.db, input).await?))
}

async fn deactivate_players(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<IdsInput>,
) -> Result<Json<BulkOutcome>, ApiError> {
    user.require(Permission::BulkOperations)?;
    Ok(Json(bulk::deactivate_players(&state.db, &state.cache, input).await?))
}

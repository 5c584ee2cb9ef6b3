use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use models::member;
use service::authz::Permission;
use service::pagination::{Page, Pagination};
use service::services::member::{self as members, MemberFilter, MemberInput};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::state::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/members", get(list).post(create))
        .route("/members/:id", get(show).put(update).delete(remove))
}

async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiQuery(filter): ApiQuery<MemberFilter>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Page<member::Model>>, ApiError> {
    user.require(Permission::MemberRead)?;
    Ok(Json(members::list(&state.db, filter, page).await?))
}

async fn show(State(state): State<ServerState>, user: CurrentUser, ApiPath(id): ApiPath<Uuid>) -> Result<Json<member::Model>, ApiError> {
    user.require(Permission::MemberRead)?;
    Ok(Json(members::get(&state.db, id).await?))
}

async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<MemberInput>,
) -> Result<(StatusCode, Json<member::Model>), ApiError> {
    user.require(Permission::MemberCreate)?;
    Ok((StatusCode::CREATED, Json(members::create(&state.db, input).await?)))
}

async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<MemberInput>,
) -> Result<Json<member::Model>, ApiError> {
    user.require(Permission::MemberUpdate)?;
    Ok(Json(members::update(&state.db, id, input).await?))
}

async fn remove(State(state): State<ServerState>, user: CurrentUser, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, ApiError> {
    user.require(Permission::MemberDelete)?;
    members::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

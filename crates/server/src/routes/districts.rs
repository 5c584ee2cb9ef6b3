use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use models::district;
use service::authz::Permission;
use service::pagination::{Page, Pagination};
use service::services::district::{self as districts, DistrictDetail, DistrictInput};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::state::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/districts", get(list).post(create))
        .route("/districts/:id", get(show).put(update).delete(remove))
}

async fn list(State(state): State<ServerState>, ApiQuery(page): ApiQuery<Pagination>) -> Result<Json<Page<district::Model>>, ApiError> {
    Ok(Json(districts::list(&state.db, page).await?))
}

async fn show(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<DistrictDetail>, ApiError> {
    Ok(Json(districts::get(&state.db, &state.cache, id).await?))
}

async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<DistrictInput>,
) -> Result<(StatusCode, Json<district::Model>), ApiError> {
    user.require(Permission::DistrictCreate)?;
    Ok((StatusCode::CREATED, Json(districts::create(&state.db, &state.cache, input).await?)))
}

async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<DistrictInput>,
) -> Result<Json<district::Model>, ApiError> {
    user.require(Permission::DistrictUpdate)?;
    Ok(Json(districts::update(&state.db, &state.cache, id, input).await?))
}

async fn remove(State(state): State<ServerState>, user: CurrentUser, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, ApiError> {
    user.require(Permission::DistrictDelete)?;
    districts::delete(&state.db, &state.cache, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use models::download;
use service::authz::Permission;
use service::pagination::{Page, Pagination};
use service::services::download::{self as downloads, DownloadFilter, DownloadHit, DownloadInput};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser, MaybeUser};
use crate::state::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/downloads", get(list).post(create))
        .route("/downloads/:id", get(show).put(update).delete(remove))
        .route("/downloads/:id/hit", post(hit))
}

async fn list(
    State(state): State<ServerState>,
    viewer: MaybeUser,
    ApiQuery(filter): ApiQuery<DownloadFilter>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Page<download::Model>>, ApiError> {
    let include_inactive = viewer.has(Permission::DownloadUpdate);
    Ok(Json(downloads::list(&state.db, filter, include_inactive, page).await?))
}

async fn show(State(state): State<ServerState>, viewer: MaybeUser, ApiPath(id): ApiPath<Uuid>) -> Result<Json<download::Model>, ApiError> {
    let include_inactive = viewer.has(Permission::DownloadUpdate);
    Ok(Json(downloads::get(&state.db, id, include_inactive).await?))
}

async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<DownloadInput>,
) -> Result<(StatusCode, Json<download::Model>), ApiError> {
    user.require(Permission::DownloadCreate)?;
    Ok((StatusCode::CREATED, Json(downloads::create(&state.db, input).await?)))
}

async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<DownloadInput>,
) -> Result<Json<download::Model>, ApiError> {
    user.require(Permission::DownloadUpdate)?;
    Ok(Json(downloads::update(&state.db, id, input).await?))
}

async fn remove(State(state): State<ServerState>, user: CurrentUser, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, ApiError> {
    user.require(Permission::DownloadDelete)?;
    downloads::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn hit(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<DownloadHit>, ApiError> {
    Ok(Json(downloads::hit(&state.db, id).await?))
}

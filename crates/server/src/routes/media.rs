use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use models::media_item;
use service::authz::Permission;
use service::pagination::{Page, Pagination};
use service::services::media::{self, MediaFilter, MediaInput};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::state::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/media", get(list).post(create))
        .route("/media/:id", get(show).put(update).delete(remove))
}

async fn list(
    State(state): State<ServerState>,
    ApiQuery(filter): ApiQuery<MediaFilter>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Page<media_item::Model>>, ApiError> {
    Ok(Json(media::list(&state.db, filter, page).await?))
}

async fn show(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<media_item::Model>, ApiError> {
    Ok(Json(media::get(&state.db, id).await?))
}

async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<MediaInput>,
) -> Result<(StatusCode, Json<media_item::Model>), ApiError> {
    let uploader = user.require(Permission::MediaCreate)?.user_id;
    Ok((StatusCode::CREATED, Json(media::create(&state.db, Some(uploader), input).await?)))
}

async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<MediaInput>,
) -> Result<Json<media_item::Model>, ApiError> {
    user.require(Permission::MediaUpdate)?;
    Ok(Json(media::update(&state.db, id, input).await?))
}

async fn remove(State(state): State<ServerState>, user: CurrentUser, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, ApiError> {
    user.require(Permission::MediaDelete)?;
    media::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

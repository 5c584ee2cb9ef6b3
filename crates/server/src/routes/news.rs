use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use models::news_article;
use service::authz::Permission;
use service::pagination::{Page, Pagination};
use service::services::news::{self, NewsFilter, NewsInput, ScheduleInput};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser, MaybeUser};
use crate::state::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/news", get(list).post(create))
        .route("/news/:id", get(show).put(update).delete(remove))
        .route("/news/:id/publish", post(publish))
        .route("/news/:id/schedule", post(schedule))
        .route("/news/:id/archive", post(archive))
}

/// Anonymous readers and plain users only ever see published articles.
async fn list(
    State(state): State<ServerState>,
    viewer: MaybeUser,
    ApiQuery(filter): ApiQuery<NewsFilter>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Page<news_article::Model>>, ApiError> {
    let include_unpublished = viewer.has(Permission::NewsUpdate);
    Ok(Json(news::list(&state.db, filter, include_unpublished, page).await?))
}

/// The path segment is an id or a slug.
async fn show(State(state): State<ServerState>, viewer: MaybeUser, ApiPath(key): ApiPath<String>) -> Result<Json<news_article::Model>, ApiError> {
    let include_unpublished = viewer.has(Permission::NewsUpdate);
    let article = match Uuid::parse_str(&key) {
        Ok(id) => news::get(&state.db, &state.cache, id, include_unpublished).await?,
        Err(_) => news::get_by_slug(&state.db, &state.cache, &key, include_unpublished).await?,
    };
    Ok(Json(article))
}

async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<NewsInput>,
) -> Result<(StatusCode, Json<news_article::Model>), ApiError> {
    let author = user.require(Permission::NewsCreate)?.user_id;
    Ok((StatusCode::CREATED, Json(news::create(&state.db, &state.cache, Some(author), input).await?)))
}

async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<NewsInput>,
) -> Result<Json<news_article::Model>, ApiError> {
    user.require(Permission::NewsUpdate)?;
    Ok(Json(news::update(&state.db, &state.cache, id, input).await?))
}

async fn remove(State(state): State<ServerState>, user: CurrentUser, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, ApiError> {
    user.require(Permission::NewsDelete)?;
    news::delete(&state.db, &state.cache, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn publish(State(state): State<ServerState>, user: CurrentUser, ApiPath(id): ApiPath<Uuid>) -> Result<Json<news_article::Model>, ApiError> {
    user.require(Permission::NewsPublish)?;
    Ok(Json(news::publish(&state.db, &state.cache, id).await?))
}

async fn schedule(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<ScheduleInput>,
) -> Result<Json<news_article::Model>, ApiError> {
    user.require(Permission::NewsPublish)?;
    Ok(Json(news::schedule(&state.db, &state.cache, id, input.publish_at).await?))
}

async fn archive(State(state): State<ServerState>, user: CurrentUser, ApiPath(id): ApiPath<Uuid>) -> Result<Json<news_article::Model>, ApiError> {
    user.require(Permission::NewsPublish)?;
    Ok(Json(news::archive(&state.db, &state.cache, id).await?))
}

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use models::{achievement, player};
use service::authz::Permission;
use service::pagination::{Page, Pagination};
use service::services::player::{self as players, AchievementInput, PlayerDetail, PlayerFilter, PlayerInput};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::state::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/players", get(list).post(create))
        .route("/players/:id", get(show).put(update).delete(remove))
        .route("/players/:id/achievements", get(list_achievements).post(add_achievement))
        .route("/players/:id/achievements/:achievement_id", delete(remove_achievement))
}

async fn list(
    State(state): State<ServerState>,
    ApiQuery(filter): ApiQuery<PlayerFilter>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Page<player::Model>>, ApiError> {
    Ok(Json(players::list(&state.db, filter, page).await?))
}

async fn show(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<PlayerDetail>, ApiError> {
    Ok(Json(players::get(&state.db, &state.cache, id).await?))
}

async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<PlayerInput>,
) -> Result<(StatusCode, Json<player::Model>), ApiError> {
    user.require(Permission::PlayerCreate)?;
    Ok((StatusCode::CREATED, Json(players::create(&state.db, &state.cache, input).await?)))
}

async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<PlayerInput>,
) -> Result<Json<player::Model>, ApiError> {
    user.require(Permission::PlayerUpdate)?;
    Ok(Json(players::update(&state.db, &state.cache, id, input).await?))
}

async fn remove(State(state): State<ServerState>, user: CurrentUser, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, ApiError> {
    user.require(Permission::PlayerDelete)?;
    players::delete(&state.db, &state.cache, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_achievements(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<Vec<achievement::Model>>, ApiError> {
    Ok(Json(players::list_achievements(&state.db, id).await?))
}

async fn add_achievement(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<AchievementInput>,
) -> Result<(StatusCode, Json<achievement::Model>), ApiError> {
    user.require(Permission::PlayerUpdate)?;
    Ok((StatusCode::CREATED, Json(players::add_achievement(&state.db, &state.cache, id, input).await?)))
}

async fn remove_achievement(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiPath((id, achievement_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    user.require(Permission::PlayerUpdate)?;
    players::delete_achievement(&state.db, &state.cache, id, achievement_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

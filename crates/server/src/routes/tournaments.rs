use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use models::{tournament, tournament_registration};
use service::authz::Permission;
use service::pagination::{Page, Pagination};
use service::services::bracket::Bracket;
use service::services::tournament::{self as tournaments, RegistrationInput, RegistrationView, TournamentFilter, TournamentInput};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::state::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/tournaments", get(list).post(create))
        .route("/tournaments/:id", get(show).put(update).delete(remove))
        .route("/tournaments/:id/registrations", get(registrations).post(register))
        .route("/tournaments/:id/registrations/:player_id", delete(withdraw))
        .route("/tournaments/:id/bracket", get(bracket))
}

async fn list(
    State(state): State<ServerState>,
    ApiQuery(filter): ApiQuery<TournamentFilter>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Page<tournament::Model>>, ApiError> {
    Ok(Json(tournaments::list(&state.db, filter, page).await?))
}

async fn show(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<tournament::Model>, ApiError> {
    Ok(Json(tournaments::get(&state.db, &state.cache, id).await?))
}

async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<TournamentInput>,
) -> Result<(StatusCode, Json<tournament::Model>), ApiError> {
    user.require(Permission::TournamentCreate)?;
    Ok((StatusCode::CREATED, Json(tournaments::create(&state.db, &state.cache, input).await?)))
}

async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<TournamentInput>,
) -> Result<Json<tournament::Model>, ApiError> {
    user.require(Permission::TournamentUpdate)?;
    Ok(Json(tournaments::update(&state.db, &state.cache, id, input).await?))
}

async fn remove(State(state): State<ServerState>, user: CurrentUser, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, ApiError> {
    user.require(Permission::TournamentDelete)?;
    tournaments::delete(&state.db, &state.cache, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn registrations(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<Vec<RegistrationView>>, ApiError> {
    Ok(Json(tournaments::list_registrations(&state.db, id).await?))
}

async fn register(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<RegistrationInput>,
) -> Result<(StatusCode, Json<tournament_registration::Model>), ApiError> {
    user.require(Permission::TournamentUpdate)?;
    Ok((StatusCode::CREATED, Json(tournaments::register(&state.db, id, input).await?)))
}

async fn withdraw(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiPath((id, player_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    user.require(Permission::TournamentUpdate)?;
    tournaments::withdraw(&state.db, id, player_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn bracket(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<Bracket>, ApiError> {
    Ok(Json(tournaments::bracket(&state.db, id).await?))
}

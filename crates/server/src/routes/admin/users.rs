use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use service::authz::{Permission, Role};
use service::pagination::{Page, Pagination};
use service::services::user::{self as users, NewUser, PasswordReset, PasswordResetInput, UserUpdate, UserView};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::state::ServerState;

#[derive(Debug, Deserialize)]
pub struct RolesInput {
    pub roles: Vec<Role>,
}

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/admin/users", get(list).post(create))
        .route("/admin/users/:id", get(show).put(update).delete(remove))
        .route("/admin/users/:id/roles", put(replace_roles))
        .route("/admin/users/:id/password", post(reset_password))
}

async fn list(State(state): State<ServerState>, user: CurrentUser, ApiQuery(page): ApiQuery<Pagination>) -> Result<Json<Page<UserView>>, ApiError> {
    user.require(Permission::UserRead)?;
    Ok(Json(users::list(&state.db, page).await?))
}

async fn show(State(state): State<ServerState>, user: CurrentUser, ApiPath(id): ApiPath<Uuid>) -> Result<Json<UserView>, ApiError> {
    user.require(Permission::UserRead)?;
    Ok(Json(users::get(&state.db, id).await?))
}

async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    let actor = user.require(Permission::UserCreate)?;
    Ok((StatusCode::CREATED, Json(users::create(&state.db, actor, input).await?)))
}

async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UserUpdate>,
) -> Result<Json<UserView>, ApiError> {
    let actor = user.require(Permission::UserUpdate)?;
    Ok(Json(users::update(&state.db, actor, id, input).await?))
}

async fn remove(State(state): State<ServerState>, user: CurrentUser, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, ApiError> {
    let actor = user.require(Permission::UserDelete)?;
    users::delete(&state.db, actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn replace_roles(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<RolesInput>,
) -> Result<Json<UserView>, ApiError> {
    let actor = user.require(Permission::RoleAssign)?;
    Ok(Json(users::replace_roles(&state.db, actor, id, input.roles).await?))
}

async fn reset_password(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    body: Option<ApiJson<PasswordResetInput>>,
) -> Result<Json<PasswordReset>, ApiError> {
    let actor = user.require(Permission::UserUpdate)?;
    let input = body.map(|ApiJson(b)| b).unwrap_or_default();
    Ok(Json(users::reset_password(&state.db, actor, id, input).await?))
}

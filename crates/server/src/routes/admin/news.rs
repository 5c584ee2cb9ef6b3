use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use models::news_article;
use serde::Serialize;
use service::authz::Permission;
use service::pagination::{Page, Pagination};
use service::services::news;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::extract::{ApiQuery, CurrentUser};
use crate::state::ServerState;

#[derive(Debug, Serialize)]
pub struct PublishDueResult {
    pub published: usize,
    pub ids: Vec<Uuid>,
    pub run_at: DateTime<Utc>,
}

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/admin/news/scheduled", get(scheduled))
        .route("/admin/news/publish-due", post(publish_due))
}

async fn scheduled(
    State(state): State<ServerState>,
    user: CurrentUser,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Page<news_article::Model>>, ApiError> {
    user.require(Permission::NewsPublish)?;
    Ok(Json(news::list_scheduled(&state.db, page).await?))
}

async fn publish_due(State(state): State<ServerState>, user: CurrentUser) -> Result<Json<PublishDueResult>, ApiError> {
    user.require(Permission::NewsPublish)?;
    let run_at = Utc::now();
    let ids = news::publish_due(&state.db, &state.cache, run_at).await?;
    Ok(Json(PublishDueResult { published: ids.len(), ids, run_at }))
}

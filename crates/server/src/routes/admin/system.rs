use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use service::authz::Permission;
use service::cache::CacheStats;
use service::services::system::{self, SystemHealth};
use tracing::info;

use crate::errors::ApiError;
use crate::extract::CurrentUser;
use crate::metrics;
use crate::state::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/admin/system/health", get(health))
        .route("/admin/system/metrics", get(prometheus_metrics))
        .route("/admin/system/cache/clear", post(clear_cache))
}

async fn health(State(state): State<ServerState>, user: CurrentUser) -> Result<Json<SystemHealth>, ApiError> {
    user.require(Permission::SystemHealth)?;
    Ok(Json(system::health(&state.db, &state.cache, state.started_at).await))
}

async fn prometheus_metrics(user: CurrentUser) -> Result<impl IntoResponse, ApiError> {
    user.require(Permission::SystemHealth)?;
    let body = metrics::encode_metrics().map_err(ApiError::internal)?;
    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}

async fn clear_cache(State(state): State<ServerState>, user: CurrentUser) -> Result<Json<CacheStats>, ApiError> {
    let actor = user.require(Permission::SystemManage)?;
    state.cache.clear();
    info!(actor = %actor.username, "cache cleared");
    Ok(Json(state.cache.stats().await))
}

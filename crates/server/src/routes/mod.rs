use axum::routing::get;
use axum::{Json, Router};
use common::types::Health;

use crate::state::ServerState;

pub mod admin;
pub mod auth;
pub mod districts;
pub mod downloads;
pub mod media;
pub mod members;
pub mod news;
pub mod players;
pub mod tournaments;

pub const API_PREFIX: &str = "/api/v1";

pub async fn health() -> Json<Health> {
    Json(Health::ok())
}

/// Every `/api/v1` route, without the prefix.
pub fn api_router() -> Router<ServerState> {
    Router::new()
        .merge(auth::router())
        .merge(members::router())
        .merge(players::router())
        .merge(tournaments::router())
        .merge(districts::router())
        .merge(news::router())
        .merge(media::router())
        .merge(downloads::router())
        .merge(admin::router())
}

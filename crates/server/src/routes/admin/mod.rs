//! `/admin/**`: back-office operations. Every handler checks its own permission.

use axum::Router;

use crate::state::ServerState;

pub mod audit;
pub mod bulk;
pub mod news;
pub mod system;
pub mod users;

pub fn router() -> Router<ServerState> {
    Router::new()
        .merge(users::router())
        .merge(audit::router())
        .merge(bulk::router())
        .merge(news::router())
        .merge(system::router())
}

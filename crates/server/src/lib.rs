//! HTTP layer of the association backend (axum).

pub mod errors;
pub mod extract;
pub mod metrics;
pub mod middleware;
pub mod rate_limit;
pub mod routes;
pub mod startup;
pub mod state;

pub use startup::{build_router, build_state, run};
pub use state::ServerState;

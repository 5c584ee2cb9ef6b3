use std::net::SocketAddr;

use axum::http::{header, HeaderValue, Method};
use axum::{middleware, Router};
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{info, warn, Level};

use crate::errors::{attach_request_path, fallback, StartupError};
use crate::middleware::{audit, auth, security};
use crate::routes::{self, API_PREFIX};
use crate::state::ServerState;
use crate::{metrics, rate_limit};

const LIMITER_PRUNE_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

fn build_cors(cfg: &configs::CorsConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);
    if cfg.allows_any() {
        return base.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = cfg
        .allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(origins)).allow_credentials(true)
}

/// Full application router: `/health`, `/api/v1/**` and the cross-cutting layers.
pub fn build_router(state: ServerState) -> Router {
    let api = routes::api_router()
        .layer(middleware::from_fn_with_state(state.clone(), auth::authenticate))
        .layer(middleware::from_fn_with_state(state.clone(), audit::audit));

    let mut app = Router::new()
        .route("/health", axum::routing::get(routes::health))
        .nest(API_PREFIX, api)
        .fallback(fallback)
        .with_state(state.clone())
        .layer(middleware::from_fn(attach_request_path))
        .layer(build_cors(&state.config.cors));
    for layer in security::layers() {
        app = app.layer(layer);
    }
    app.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
            .on_request(DefaultOnRequest::new().level(Level::DEBUG))
            .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
            .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
    )
}

/// Connects, migrates and provisions the database, then assembles the state.
pub async fn build_state(config: configs::AppConfig) -> Result<ServerState, StartupError> {
    let db = models::db::connect_with_config(&config.database)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    prepare_database(&db, &config).await?;
    Ok(ServerState::new(db, config))
}

async fn prepare_database(db: &DatabaseConnection, config: &configs::AppConfig) -> Result<(), StartupError> {
    migration::Migrator::up(db, None)
        .await
        .map_err(|e| StartupError::Database(format!("migrations failed: {e}")))?;
    info!("database migrations applied");
    service::bootstrap::ensure_super_admin(db, &config.bootstrap)
        .await
        .map_err(|e| StartupError::InvalidConfig(format!("bootstrap admin: {e}")))?;
    Ok(())
}

/// Starts background tasks, binds and serves until Ctrl+C.
pub async fn run(config: configs::AppConfig) -> anyhow::Result<()> {
    if config.auth.is_dev_secret() {
        warn!("using the development JWT secret; set JWT_SECRET in production");
    }
    metrics::init();
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = build_state(config).await?;

    let publish_every = std::time::Duration::from_secs(state.config.scheduler.publish_interval_secs);
    let publisher = service::scheduler::spawn_publisher(state.db.clone(), state.cache.clone(), publish_every);
    let retention = if state.config.audit.enabled {
        service::scheduler::spawn_audit_retention(state.db.clone(), state.config.audit.retention_days)
    } else {
        None
    };

    let idle = state.login_limiter.refill_window();
    let pruner = rate_limit::spawn_pruner(state.login_limiter.clone(), LIMITER_PRUNE_INTERVAL, idle);

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "association admin api listening");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    for task in [publisher, retention].into_iter().flatten() {
        task.abort();
    }
    pruner.abort();
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl_c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

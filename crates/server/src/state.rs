use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::AuthService;
use service::cache::AppCache;

use crate::rate_limit::KeyedRateLimiter;

pub type Auth = AuthService<SeaOrmAuthRepository>;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: Arc<Auth>,
    pub cache: AppCache,
    pub login_limiter: KeyedRateLimiter,
    pub config: Arc<configs::AppConfig>,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(db: DatabaseConnection, config: configs::AppConfig) -> Self {
        let repo = Arc::new(SeaOrmAuthRepository::new(db.clone()));
        let auth = Arc::new(AuthService::new(repo, (&config.auth).into()));
        Self {
            cache: AppCache::new(&config.cache),
            login_limiter: KeyedRateLimiter::from_config(&config.rate_limit),
            auth,
            db,
            config: Arc::new(config),
            started_at: Utc::now(),
        }
    }
}

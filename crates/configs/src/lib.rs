use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

/// Development-only signing secret; startup warns when it is still in use.
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

impl DatabaseConfig {
    /// Single-connection in-memory SQLite, used by tests.
    pub fn sqlite_memory() -> Self {
        Self { url: "sqlite::memory:".into(), max_connections: 1, min_connections: 1, ..Self::default() }
    }

    pub fn is_sqlite(&self) -> bool {
        self.url.trim().to_lowercase().starts_with("sqlite:")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_secs: u64,
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_secs: u64,
    #[serde(default)]
    pub cookie_secure: bool,
}

fn default_jwt_secret() -> String { DEV_JWT_SECRET.to_string() }
fn default_issuer() -> String { "association-admin".to_string() }
fn default_access_ttl() -> u64 { 3600 }
fn default_refresh_ttl() -> u64 { 7 * 24 * 3600 }

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            issuer: default_issuer(),
            access_token_ttl_secs: default_access_ttl(),
            refresh_token_ttl_secs: default_refresh_ttl(),
            cookie_secure: false,
        }
    }
}

impl AuthConfig {
    pub fn is_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
}

fn default_true() -> bool { true }
fn default_cache_ttl() -> u64 { 300 }
fn default_cache_capacity() -> u64 { 10_000 }

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true, ttl_secs: default_cache_ttl(), max_capacity: default_cache_capacity() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_origins() -> Vec<String> { vec!["*".to_string()] }

impl Default for CorsConfig {
    fn default() -> Self {
        Self { allowed_origins: default_origins() }
    }
}

impl CorsConfig {
    pub fn allows_any(&self) -> bool {
        self.allowed_origins.iter().any(|o| o.trim() == "*")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_login_rpm")]
    pub login_requests_per_minute: u32,
    #[serde(default = "default_login_burst")]
    pub login_burst: u32,
    /// Key buckets on the first `X-Forwarded-For` hop. Enable only behind a proxy that overwrites the header.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

fn default_login_rpm() -> u32 { 10 }
fn default_login_burst() -> u32 { 5 }

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            login_requests_per_minute: default_login_rpm(),
            login_burst: default_login_burst(),
            trust_forwarded_for: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// 0 disables the background publication task.
    #[serde(default = "default_publish_interval")]
    pub publish_interval_secs: u64,
}

fn default_publish_interval() -> u64 { 60 }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { publish_interval_secs: default_publish_interval() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
    #[serde(default)]
    pub admin_password: Option<String>,
}

fn default_admin_username() -> String { "admin".to_string() }
fn default_admin_email() -> String { "admin@association.local".to_string() }

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self { admin_username: default_admin_username(), admin_email: default_admin_email(), admin_password: None }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub include_reads: bool,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_retention_days() -> u32 { 365 }

impl Default for AuditConfig {
    fn default() -> Self {
        Self { enabled: true, include_reads: true, retention_days: default_retention_days() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_format() -> String { "compact".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { format: default_log_format() }
    }
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Config file when present, otherwise defaults; then env overrides and validation.
    pub fn load() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_missing_file(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.apply_env_overrides(|key| std::env::var(key).ok());
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.apply_env_overrides(|key| std::env::var(key).ok());
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Environment wins over the file for deployment-specific values.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Some(threads) = lookup("TOKIO_WORKER_THREADS").and_then(|v| v.parse::<usize>().ok()) {
            self.server.worker_threads = Some(threads);
        }
        if let Some(pw) = lookup("BOOTSTRAP_ADMIN_PASSWORD") {
            self.bootstrap.admin_password = Some(pw);
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.validate()?;
        self.auth.validate()?;
        if self.cors.allowed_origins.is_empty() {
            return Err(anyhow!("cors.allowed_origins must not be empty; use [\"*\"] to allow any origin"));
        }
        if self.cache.enabled && self.cache.max_capacity == 0 {
            return Err(anyhow!("cache.max_capacity must be > 0 when the cache is enabled"));
        }
        if self.rate_limit.enabled && (self.rate_limit.login_requests_per_minute == 0 || self.rate_limit.login_burst == 0) {
            return Err(anyhow!("rate_limit values must be > 0 when rate limiting is enabled"));
        }
        Ok(())
    }
}

fn is_missing_file(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://") || lower.starts_with("sqlite:")) {
            return Err(anyhow!("database.url must start with postgres://, postgresql:// or sqlite:"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("auth.jwt_secret must not be empty"));
        }
        if !self.is_dev_secret() && self.jwt_secret.len() < 16 {
            return Err(anyhow!("auth.jwt_secret must be at least 16 bytes"));
        }
        if self.access_token_ttl_secs == 0 || self.refresh_token_ttl_secs == 0 {
            return Err(anyhow!("auth token lifetimes must be positive"));
        }
        if self.refresh_token_ttl_secs <= self.access_token_ttl_secs {
            return Err(anyhow!("auth.refresh_token_ttl_secs must exceed access_token_ttl_secs"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn with_url(url: &str) -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.database.url = url.to_string();
        cfg
    }

    #[test]
    fn parses_full_document() {
        let cfg = parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [database]
            url = "postgres://u:p@localhost/assoc"
            max_connections = 20

            [auth]
            jwt_secret = "0123456789abcdef0123"
            access_token_ttl_secs = 600

            [cors]
            allowed_origins = ["https://association.example"]

            [scheduler]
            publish_interval_secs = 0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.database.max_connections, 20);
        assert_eq!(cfg.database.min_connections, 2);
        assert_eq!(cfg.auth.access_token_ttl_secs, 600);
        assert_eq!(cfg.auth.refresh_token_ttl_secs, 7 * 24 * 3600);
        assert!(!cfg.cors.allows_any());
        assert_eq!(cfg.scheduler.publish_interval_secs, 0);
        assert!(cfg.cache.enabled);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert!(cfg.auth.is_dev_secret());
        assert!(cfg.cors.allows_any());
        assert_eq!(cfg.audit.retention_days, 365);
    }

    #[test]
    fn env_overrides_take_precedence() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "sqlite::memory:"),
            ("JWT_SECRET", "a-much-longer-production-secret"),
            ("SERVER_PORT", "7070"),
            ("SERVER_HOST", "0.0.0.0"),
        ]);
        let mut cfg = with_url("postgres://ignored");
        cfg.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.database.url, "sqlite::memory:");
        assert_eq!(cfg.server.port, 7070);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert!(!cfg.auth.is_dev_secret());
        cfg.normalize_and_validate().unwrap();
    }

    #[test]
    fn unparsable_port_override_is_ignored() {
        let mut cfg = with_url("sqlite::memory:");
        cfg.apply_env_overrides(|k| (k == "SERVER_PORT").then(|| "not-a-port".to_string()));
        assert_eq!(cfg.server.port, 8080);
    }

    #[test]
    fn rejects_unknown_database_scheme() {
        let mut cfg = with_url("mysql://localhost/db");
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn rejects_inverted_pool_bounds() {
        let mut cfg = with_url("postgres://localhost/db");
        cfg.database.min_connections = 5;
        cfg.database.max_connections = 2;
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn rejects_short_production_secret() {
        let mut cfg = with_url("postgres://localhost/db");
        cfg.auth.jwt_secret = "short".into();
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn refresh_ttl_must_exceed_access_ttl() {
        let mut cfg = with_url("postgres://localhost/db");
        cfg.auth.refresh_token_ttl_secs = cfg.auth.access_token_ttl_secs;
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn zero_port_is_rejected_and_threads_normalized() {
        let mut cfg = with_url("sqlite::memory:");
        cfg.server.worker_threads = Some(0);
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.server.worker_threads, Some(4));

        cfg.server.port = 0;
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn empty_cors_list_is_rejected() {
        let mut cfg = with_url("sqlite::memory:");
        cfg.cors.allowed_origins.clear();
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn sqlite_memory_preset_is_single_connection() {
        let db = DatabaseConfig::sqlite_memory();
        assert!(db.is_sqlite());
        assert_eq!(db.max_connections, 1);
        db.validate().unwrap();
    }
}

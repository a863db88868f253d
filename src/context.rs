/// Application context and dependency injection
use crate::{
    admin::{AuditLogManager, FlagManager, ModerationManager},
    config::ServerConfig,
    db,
    error::{RelmonError, RelmonResult},
    rate_limit::{RateLimitConfig, RateLimiter},
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    // Moderation & audit
    pub moderation_manager: Arc<ModerationManager>,
    pub flag_manager: Arc<FlagManager>,
    pub audit_log_manager: Arc<AuditLogManager>,
    // Rate limiter
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> RelmonResult<Self> {
        // Validate configuration
        config.validate()?;

        // Create data directories if they don't exist
        Self::ensure_directories(&config).await?;

        let options = db::DatabaseOptions {
            max_connections: config.storage.max_connections,
            ..Default::default()
        };
        let db = db::create_pool(&config.storage.database, options).await?;

        db::run_migrations(&db).await?;
        db::test_connection(&db).await?;

        tracing::info!("Database ready at {:?}", config.storage.database);

        Ok(Self::with_pool(config, db))
    }

    /// Wire the managers around an already migrated pool
    pub fn with_pool(config: ServerConfig, db: SqlitePool) -> Self {
        let default_limit = config.browse.default_limit;

        let moderation_manager = Arc::new(ModerationManager::new(db.clone()));
        let flag_manager = Arc::new(FlagManager::new(db.clone(), default_limit));
        let audit_log_manager = Arc::new(AuditLogManager::new(db.clone(), default_limit));

        let rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig::from(&config.rate_limit)));

        Self {
            config: Arc::new(config),
            db,
            moderation_manager,
            flag_manager,
            audit_log_manager,
            rate_limiter,
        }
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> RelmonResult<()> {
        let dir = &config.storage.data_directory;
        if !dir.exists() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                RelmonError::Internal(format!("Failed to create directory {:?}: {}", dir, e))
            })?;
        }

        Ok(())
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}

/// Configuration management for the moderation service
use crate::admin::search::DEFAULT_LIMIT;
use crate::error::{RelmonError, RelmonResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub browse: BrowseConfig,
    pub rate_limit: RateLimitSettings,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
    pub max_connections: u32,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Usernames recognized as administrators (comma-separated in env)
    pub admin_users: Vec<String>,
}

impl AuthConfig {
    /// The "is this actor an administrator" predicate
    pub fn is_admin(&self, username: &str) -> bool {
        self.admin_users.iter().any(|u| u == username)
    }
}

/// Defaults for the log and flag browsers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowseConfig {
    pub default_limit: i64,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub admin_rps: u32,
    pub user_rps: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> RelmonResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("RELMON_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("RELMON_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .map_err(|_| RelmonError::Validation("Invalid port number".to_string()))?;
        let version = env::var("RELMON_VERSION")
            .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());

        let data_directory: PathBuf = env::var("RELMON_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database = env::var("RELMON_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("relmon.sqlite"));
        let max_connections = env::var("RELMON_DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);

        let jwt_secret = env::var("RELMON_JWT_SECRET")
            .map_err(|_| RelmonError::Validation("JWT secret required".to_string()))?;

        let admin_users = parse_list(&env::var("RELMON_ADMIN_USERS").unwrap_or_default());

        let default_limit = env::var("RELMON_DEFAULT_PAGE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_LIMIT);

        let rate_limit_enabled = env::var("RELMON_RATE_LIMITS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);
        let admin_rps = env::var("RELMON_RATE_LIMIT_ADMIN_RPS")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .unwrap_or(100);
        let user_rps = env::var("RELMON_RATE_LIMIT_USER_RPS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);

        let log_level = env::var("RUST_LOG")
            .unwrap_or_else(|_| "relmon_admin=debug,tower_http=debug".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
            },
            storage: StorageConfig {
                data_directory,
                database,
                max_connections,
            },
            authentication: AuthConfig {
                jwt_secret,
                admin_users,
            },
            browse: BrowseConfig { default_limit },
            rate_limit: RateLimitSettings {
                enabled: rate_limit_enabled,
                admin_rps,
                user_rps,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> RelmonResult<()> {
        if self.service.hostname.is_empty() {
            return Err(RelmonError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.authentication.jwt_secret.len() < 32 {
            return Err(RelmonError::Validation(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        if self.browse.default_limit <= 0 {
            return Err(RelmonError::Validation(
                "Default page limit must be positive".to_string(),
            ));
        }

        if self.authentication.admin_users.is_empty() {
            tracing::warn!("No administrators configured; all moderation actions will be refused");
        }

        Ok(())
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
pub(crate) fn test_config() -> ServerConfig {
    ServerConfig {
        service: ServiceConfig {
            hostname: "localhost".to_string(),
            port: 5000,
            version: "test".to_string(),
        },
        storage: StorageConfig {
            data_directory: PathBuf::from("./data"),
            database: PathBuf::from(":memory:"),
            max_connections: 1,
        },
        authentication: AuthConfig {
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            admin_users: vec!["admin".to_string()],
        },
        browse: BrowseConfig {
            default_limit: DEFAULT_LIMIT,
        },
        rate_limit: RateLimitSettings {
            enabled: false,
            admin_rps: 100,
            user_rps: 10,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
    }
}

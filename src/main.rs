/// relmon-admin - moderation and audit service for a release monitoring catalog
///
/// Administrators edit distributions, remove projects, package mappings and
/// versions, and triage user flags. Every effective change is written to an
/// audit log that users can browse.

mod admin;
mod api;
mod auth;
mod config;
mod context;
mod db;
mod error;
mod metrics;
mod rate_limit;
mod server;

use config::ServerConfig;
use context::AppContext;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::from_env()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Starting relmon-admin v{} ({} administrators configured)",
        env!("CARGO_PKG_VERSION"),
        config.authentication.admin_users.len()
    );

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}

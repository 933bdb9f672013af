//! PostgreSQL storage for slates, model predictions and committed pick sets.
//!
//! Pick generation is a short-lived, single-invocation process, so the pool
//! defaults are small. Every setting can still be overridden from the
//! environment.

pub mod retry;
pub mod store;

pub use store::PgPickemStore;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::env;
use std::time::Duration;

/// Database pool configuration
#[derive(Debug, Clone)]
pub struct DbPoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for DbPoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 4,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(60),
            max_lifetime: Duration::from_secs(600),
        }
    }
}

impl DbPoolConfig {
    /// Environment overrides on top of `defaults`.
    pub fn from_env_with_defaults(defaults: Self) -> Self {
        Self {
            max_connections: env_parse("DB_MAX_CONNECTIONS").unwrap_or(defaults.max_connections),
            min_connections: env_parse("DB_MIN_CONNECTIONS").unwrap_or(defaults.min_connections),
            acquire_timeout: env_parse("DB_ACQUIRE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.acquire_timeout),
            idle_timeout: env_parse("DB_IDLE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.idle_timeout),
            max_lifetime: env_parse("DB_MAX_LIFETIME_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.max_lifetime),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

fn pool_options(config: &DbPoolConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections.min(config.max_connections))
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.max_lifetime)
}

/// Host and database part of a connection URL, without credentials.
fn database_target(database_url: &str) -> &str {
    database_url
        .rsplit_once('@')
        .map_or(database_url, |(_, target)| target)
}

/// Open a pool against `database_url`. A minimum above the maximum is capped.
///
/// ```ignore
/// let config = DbPoolConfig::from_env_with_defaults(DbPoolConfig::default());
/// let store = PgPickemStore::new(create_pool(&database_url, &config).await?);
/// ```
pub async fn create_pool(database_url: &str, config: &DbPoolConfig) -> Result<PgPool> {
    let target = database_target(database_url);
    let pool = pool_options(config)
        .connect(database_url)
        .await
        .with_context(|| format!("Failed to connect to {}", target))?;

    tracing::info!(
        "Connected to {} (pool {}..{})",
        target,
        config.min_connections.min(config.max_connections),
        config.max_connections
    );

    Ok(pool)
}

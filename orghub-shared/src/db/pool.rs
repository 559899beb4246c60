/// Database connection pool management
///
/// This module builds the PostgreSQL connection pool from discrete connection
/// parameters and wraps the initial connect in a retry loop with exponential
/// backoff, so the server tolerates a database that is still starting up.
///
/// # Example
///
/// ```no_run
/// use orghub_shared::db::pool::{connect_with_retry, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         host: "localhost".to_string(),
///         password: "postgres".to_string(),
///         ..Default::default()
///     };
///
///     let pool = connect_with_retry(&config).await?;
///
///     let row: (i64,) = sqlx::query_as("SELECT $1")
///         .bind(42i64)
///         .fetch_one(&pool)
///         .await?;
///
///     Ok(())
/// }
/// ```

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::DbError;

/// Startup connection retry policy
///
/// The delay before attempt `n + 1` is `initial_delay * 2^(n - 1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of connection attempts (including the first)
    pub max_attempts: u32,

    /// Delay after the first failed attempt
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay.saturating_mul(factor)
    }
}

/// Configuration for the database connection pool
///
/// Mirrors the `DB_*` environment variables read by the API server.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database server host
    pub host: String,

    /// Database server port
    pub port: u16,

    /// Login role
    pub user: String,

    /// Login password
    pub password: String,

    /// Database name
    pub database: String,

    /// Upper bound on open connections (`DB_MAX_OPEN_CONNS`)
    pub max_open_connections: u32,

    /// Idle connections kept warm (`DB_MAX_IDLE_CONNS`)
    ///
    /// sqlx has no idle cap, so this becomes the pool's minimum size,
    /// clamped to `max_open_connections`.
    pub max_idle_connections: u32,

    /// Maximum lifetime of a connection before it is recycled (seconds)
    pub conn_max_lifetime_seconds: u64,

    /// How long to wait for a connection from the pool (seconds)
    pub acquire_timeout_seconds: u64,

    /// Retry policy for the initial connect
    pub retry: RetryPolicy,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            database: "orghub".to_string(),
            max_open_connections: 100,
            max_idle_connections: 10,
            conn_max_lifetime_seconds: 3600,
            acquire_timeout_seconds: 30,
            retry: RetryPolicy::default(),
        }
    }
}

impl DatabaseConfig {
    /// Builds sqlx connect options from the discrete parameters
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }

    /// Builds pool options with the configured limits
    pub fn pool_options(&self) -> PgPoolOptions {
        let max = self.max_open_connections.max(1);

        PgPoolOptions::new()
            .max_connections(max)
            .min_connections(self.max_idle_connections.min(max))
            .max_lifetime(Duration::from_secs(self.conn_max_lifetime_seconds))
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_seconds))
    }

    /// Connection target for logs (never includes the password)
    pub fn display_target(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }
}

/// Opens the pool, retrying with exponential backoff
///
/// Each attempt creates the pool and runs [`health_check`]. After
/// `retry.max_attempts` failures the last error is returned as
/// [`DbError::Connect`].
///
/// # Errors
///
/// Returns `DbError::Connect` once every attempt has failed.
pub async fn connect_with_retry(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    let attempts = config.retry.max_attempts.max(1);

    info!(
        target_db = %config.display_target(),
        max_open_connections = config.max_open_connections,
        max_idle_connections = config.max_idle_connections,
        max_attempts = attempts,
        "Connecting to database"
    );

    let mut attempt = 1;
    loop {
        match try_connect(config).await {
            Ok(pool) => {
                info!(attempt, "Database connection established");
                return Ok(pool);
            }
            Err(e) if attempt < attempts => {
                let delay = config.retry.delay_after(attempt);
                warn!(
                    attempt,
                    max_attempts = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Database connection failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                warn!(attempts, error = %e, "Giving up on database connection");
                return Err(DbError::Connect {
                    attempts,
                    source: e,
                });
            }
        }
    }
}

async fn try_connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = config
        .pool_options()
        .connect_with(config.connect_options())
        .await?;

    if let Err(e) = health_check(&pool).await {
        pool.close().await;
        return Err(e);
    }

    Ok(pool)
}

/// Performs a liveness query on the pool
///
/// # Errors
///
/// Returns an error if the query fails or returns an unexpected value.
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    debug!("Performing database health check");

    let (value,): (i32,) = sqlx::query_as("SELECT 1").fetch_one(pool).await?;

    if value != 1 {
        warn!(value, "Database health check returned unexpected value");
        return Err(sqlx::Error::Protocol(
            "Health check returned unexpected value".into(),
        ));
    }

    Ok(())
}

/// Current pool statistics
#[derive(Debug, Clone)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub active_connections: usize,

    /// Number of idle connections available
    pub idle_connections: usize,
}

pub fn get_pool_stats(pool: &PgPool) -> PoolStats {
    let size = pool.size();
    let idle = pool.num_idle() as u32;

    PoolStats {
        active_connections: size.saturating_sub(idle) as usize,
        idle_connections: idle as usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.port, 5432);
        assert_eq!(config.max_open_connections, 100);
        assert_eq!(config.max_idle_connections, 10);
        assert_eq!(config.conn_max_lifetime_seconds, 3600);
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn test_retry_policy_doubles_from_two_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(2), Duration::from_secs(4));
        assert_eq!(policy.delay_after(3), Duration::from_secs(8));
        assert_eq!(policy.delay_after(4), Duration::from_secs(16));
    }

    #[test]
    fn test_display_target_hides_password() {
        let config = DatabaseConfig {
            password: "hunter2".to_string(),
            ..Default::default()
        };
        let target = config.display_target();
        assert_eq!(target, "postgres@localhost:5432/orghub");
        assert!(!target.contains("hunter2"));
    }

    #[test]
    fn test_pool_options_clamp_idle_to_open() {
        let config = DatabaseConfig {
            max_open_connections: 4,
            max_idle_connections: 10,
            ..Default::default()
        };
        let options = config.pool_options();
        assert_eq!(options.get_max_connections(), 4);
        assert_eq!(options.get_min_connections(), 4);
    }
}

/// Persistence gateway
///
/// `Database` is constructed once at startup and owns the connection pool for
/// the life of the process. Nothing else opens connections; the store and
/// handlers receive a cloned pool handle from [`Database::pool`].

use sqlx::PgPool;
use tracing::{debug, info};

use super::{
    migrations,
    pool::{self, DatabaseConfig},
    DbError,
};

/// Owner of the process-wide connection pool
#[derive(Debug)]
pub struct Database {
    config: DatabaseConfig,
    pool: Option<PgPool>,
}

impl Database {
    /// Creates an uninitialized gateway
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config, pool: None }
    }

    /// Connection parameters this gateway was built with
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Whether `initialize()` has succeeded and `close()` has not been called
    pub fn is_initialized(&self) -> bool {
        self.pool.is_some()
    }

    /// Connects to the database with startup retry
    ///
    /// Calling this on an already initialized gateway is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connect` after all retry attempts fail.
    pub async fn initialize(&mut self) -> Result<(), DbError> {
        if self.pool.is_some() {
            debug!("Database already initialized");
            return Ok(());
        }

        let pool = pool::connect_with_retry(&self.config).await?;
        self.pool = Some(pool);
        Ok(())
    }

    /// Returns the live pool
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotInitialized` before `initialize()`.
    pub fn pool(&self) -> Result<&PgPool, DbError> {
        self.pool.as_ref().ok_or(DbError::NotInitialized)
    }

    /// Applies schema migrations and membership constraints
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway is not initialized or a migration
    /// fails. Constraint creation failures are only logged.
    pub async fn migrate(&self) -> Result<(), DbError> {
        let pool = self.pool()?;
        migrations::run_migrations(pool).await?;
        migrations::ensure_membership_constraints(pool).await;
        Ok(())
    }

    /// Liveness check against the live connection
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotInitialized` before `initialize()`, or the query
    /// error if the database does not answer.
    pub async fn ping(&self) -> Result<(), DbError> {
        let pool = self.pool()?;
        pool::health_check(pool).await?;
        Ok(())
    }

    /// Releases the pool; no-op when never initialized
    pub async fn close(&mut self) {
        let Some(pool) = self.pool.take() else {
            debug!("Database close requested but it was never initialized");
            return;
        };

        let stats = pool::get_pool_stats(&pool);
        info!(
            active_connections = stats.active_connections,
            idle_connections = stats.idle_connections,
            "Closing database connection pool"
        );
        pool.close().await;
        info!("Database connection pool closed");
    }
}

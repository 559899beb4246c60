/// Database layer for OrgHub
///
/// This module provides the persistence gateway: connection pooling with
/// startup retry, schema migrations, and liveness checks.
///
/// # Modules
///
/// - `pool`: connection parameters, retrying connect, health check
/// - `migrations`: schema migrations and best-effort membership constraints
/// - `database`: the [`Database`] gateway that owns the pool
///
/// Models are in the `models` module at crate root level.
///
/// # Example
///
/// ```no_run
/// use orghub_shared::db::{Database, pool::DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut db = Database::new(DatabaseConfig::default());
///     db.initialize().await?;
///     db.migrate().await?;
///     db.ping().await?;
///     db.close().await;
///     Ok(())
/// }
/// ```

pub mod database;
pub mod migrations;
pub mod pool;

pub use database::Database;

/// Error type for persistence gateway operations
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Gateway used before `initialize()`
    #[error("database connection is not initialized")]
    NotInitialized,

    /// All startup connection attempts failed
    #[error("failed to connect to database after {attempts} attempt(s): {source}")]
    Connect {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    /// Applying migrations failed
    #[error("failed to migrate database: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Query against a live connection failed
    #[error("database error: {0}")]
    Query(#[from] sqlx::Error),
}

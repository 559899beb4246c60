/// Configuration management for the API server
///
/// This module loads configuration from environment variables (and a `.env`
/// file when present) into a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `HOST`: Host to bind to (default: 0.0.0.0)
/// - `PORT`: Port to bind to (default: 8080)
/// - `DB_HOST`: PostgreSQL host (default: localhost)
/// - `DB_PORT`: PostgreSQL port (default: 5432)
/// - `DB_USER`: PostgreSQL user (default: postgres)
/// - `DB_PASSWORD`: PostgreSQL password (default: empty)
/// - `DB_NAME`: Database name (default: orghub)
/// - `DB_MAX_IDLE_CONNS`: Connections kept open when idle (default: 10)
/// - `DB_MAX_OPEN_CONNS`: Pool size limit (default: 100)
/// - `DB_CONN_MAX_LIFETIME`: Connection lifetime in seconds (default: 3600)
/// - `JWT_SECRET`: Secret key for JWT signing (required, 32+ characters)
/// - `JWT_EXPIRATION_HOURS`: Token lifetime (default: 24)
/// - `RUST_LOG`: Log filter (read by the tracing subscriber, not here)
///
/// # Example
///
/// ```no_run
/// use orghub_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::str::FromStr;

use anyhow::Context;
use orghub_shared::db::pool::DatabaseConfig;

/// Minimum accepted length of `JWT_SECRET`
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Upper bound for `JWT_EXPIRATION_HOURS` (one year)
pub const MAX_JWT_EXPIRATION_HOURS: i64 = 24 * 365;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Token lifetime in hours
    pub expiration_hours: i64,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `JWT_SECRET` is missing or shorter than 32 characters
    /// - A numeric variable does not parse
    /// - `JWT_EXPIRATION_HOURS` is not between 1 and 8760
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = DatabaseConfig::default();

        let jwt_secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            anyhow::bail!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        let expiration_hours: i64 = parse_or(&lookup, "JWT_EXPIRATION_HOURS", 24)?;
        if !(1..=MAX_JWT_EXPIRATION_HOURS).contains(&expiration_hours) {
            anyhow::bail!(
                "JWT_EXPIRATION_HOURS must be between 1 and {}, got {}",
                MAX_JWT_EXPIRATION_HOURS,
                expiration_hours
            );
        }

        Ok(Self {
            api: ApiConfig {
                host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "PORT", 8080)?,
            },
            database: DatabaseConfig {
                host: lookup("DB_HOST").unwrap_or(defaults.host),
                port: parse_or(&lookup, "DB_PORT", defaults.port)?,
                user: lookup("DB_USER").unwrap_or(defaults.user),
                password: lookup("DB_PASSWORD").unwrap_or(defaults.password),
                database: lookup("DB_NAME").unwrap_or(defaults.database),
                max_idle_connections: parse_or(
                    &lookup,
                    "DB_MAX_IDLE_CONNS",
                    defaults.max_idle_connections,
                )?,
                max_open_connections: parse_or(
                    &lookup,
                    "DB_MAX_OPEN_CONNS",
                    defaults.max_open_connections,
                )?,
                conn_max_lifetime_seconds: parse_or(
                    &lookup,
                    "DB_CONN_MAX_LIFETIME",
                    defaults.conn_max_lifetime_seconds,
                )?,
                ..defaults
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expiration_hours,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("JWT_SECRET", SECRET)]).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.user, "postgres");
        assert_eq!(config.database.password, "");
        assert_eq!(config.database.database, "orghub");
        assert_eq!(config.database.max_idle_connections, 10);
        assert_eq!(config.database.max_open_connections, 100);
        assert_eq!(config.database.conn_max_lifetime_seconds, 3600);
        assert_eq!(config.jwt.expiration_hours, 24);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("JWT_SECRET", SECRET),
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("DB_HOST", "db"),
            ("DB_PORT", "6543"),
            ("DB_NAME", "orghub_test"),
            ("DB_MAX_OPEN_CONNS", "20"),
            ("JWT_EXPIRATION_HOURS", "2"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.database.host, "db");
        assert_eq!(config.database.port, 6543);
        assert_eq!(config.database.database, "orghub_test");
        assert_eq!(config.database.max_open_connections, 20);
        assert_eq!(config.jwt.expiration_hours, 2);
    }

    #[test]
    fn test_missing_secret() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn test_short_secret() {
        let err = load(&[("JWT_SECRET", "short")]).unwrap_err();
        assert!(err.to_string().contains("at least 32"));
    }

    #[test]
    fn test_invalid_expiration_hours() {
        for value in ["0", "-1", "8761", "9999999999999"] {
            let err = load(&[("JWT_SECRET", SECRET), ("JWT_EXPIRATION_HOURS", value)])
                .unwrap_err();
            assert!(
                err.to_string().contains("JWT_EXPIRATION_HOURS"),
                "value {:?}: {}",
                value,
                err
            );
        }

        let config = load(&[("JWT_SECRET", SECRET), ("JWT_EXPIRATION_HOURS", "8760")]).unwrap();
        assert_eq!(config.jwt.expiration_hours, MAX_JWT_EXPIRATION_HOURS);
    }

    #[test]
    fn test_malformed_number() {
        let err = load(&[("JWT_SECRET", SECRET), ("DB_PORT", "abc")]).unwrap_err();
        assert!(err.to_string().contains("DB_PORT"));
    }
}

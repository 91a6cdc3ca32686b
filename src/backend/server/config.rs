/**
 * Server Configuration
 *
 * Loads settings from environment variables (after `dotenv` has populated
 * them from a `.env` file, if present). Only `JWT_SECRET` is required;
 * everything else has a development-friendly default.
 *
 * | Variable | Default |
 * |---|---|
 * | `JWT_SECRET` | required |
 * | `SERVER_PORT` | 3000 |
 * | `DATABASE_URL` | unset: in-memory stores |
 * | `CLIENT_URL` | unset: permissive CORS |
 * | `TOKEN_TTL_DAYS` | 7 |
 * | `BLOB_UPLOAD_URL` | unset: inline image store |
 * | `HEARTBEAT_INTERVAL_SECS` | 30 |
 * | `HEARTBEAT_TIMEOUT_SECS` | 90 |
 * | `BROADCAST_CAPACITY` | 1024 |
 * | `APP_ENV` | development |
 *
 * The heartbeat interval and the broadcast capacity must be non-zero, and
 * the heartbeat timeout must not be shorter than the interval.
 *
 * Optional services that fail to initialize are logged and disabled rather
 * than preventing startup.
 */
use std::str::FromStr;
use std::time::Duration;

use sqlx::PgPool;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration value: {0}")]
    MissingValue(&'static str),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub jwt_secret: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub client_url: Option<String>,
    pub token_ttl: chrono::Duration,
    pub blob_upload_url: Option<String>,
    pub heartbeat_interval: Duration,
    pub heartbeat_timeout: Duration,
    pub broadcast_capacity: usize,
    /// `Secure` flag on the auth cookie; off only in development
    pub cookie_secure: bool,
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}

impl ServerConfig {
    /// Read the configuration from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = optional("JWT_SECRET").ok_or(ConfigError::MissingValue("JWT_SECRET"))?;
        let app_env = optional("APP_ENV").unwrap_or_else(|| "development".to_string());

        Self {
            jwt_secret,
            port: parsed("SERVER_PORT", 3000)?,
            database_url: optional("DATABASE_URL"),
            client_url: optional("CLIENT_URL"),
            token_ttl: chrono::Duration::days(parsed("TOKEN_TTL_DAYS", 7)?),
            blob_upload_url: optional("BLOB_UPLOAD_URL"),
            heartbeat_interval: Duration::from_secs(parsed("HEARTBEAT_INTERVAL_SECS", 30)?),
            heartbeat_timeout: Duration::from_secs(parsed("HEARTBEAT_TIMEOUT_SECS", 90)?),
            broadcast_capacity: parsed("BROADCAST_CAPACITY", 1024)?,
            cookie_secure: app_env != "development",
        }
        .validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.heartbeat_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "HEARTBEAT_INTERVAL_SECS",
                value: self.heartbeat_interval.as_secs().to_string(),
            });
        }
        if self.heartbeat_timeout < self.heartbeat_interval {
            return Err(ConfigError::InvalidValue {
                key: "HEARTBEAT_TIMEOUT_SECS",
                value: self.heartbeat_timeout.as_secs().to_string(),
            });
        }
        if self.broadcast_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "BROADCAST_CAPACITY",
                value: "0".to_string(),
            });
        }
        Ok(self)
    }

    pub fn builder(jwt_secret: impl Into<String>) -> ServerConfigBuilder {
        ServerConfigBuilder {
            config: Self {
                jwt_secret: jwt_secret.into(),
                port: 3000,
                database_url: None,
                client_url: None,
                token_ttl: chrono::Duration::days(7),
                blob_upload_url: None,
                heartbeat_interval: Duration::from_secs(30),
                heartbeat_timeout: Duration::from_secs(90),
                broadcast_capacity: 1024,
                cookie_secure: false,
            },
        }
    }
}

/// Builder used by tests and embedders that do not read the environment
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn client_url(mut self, url: impl Into<String>) -> Self {
        self.config.client_url = Some(url.into());
        self
    }

    pub fn token_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.config.token_ttl = ttl;
        self
    }

    pub fn blob_upload_url(mut self, url: impl Into<String>) -> Self {
        self.config.blob_upload_url = Some(url.into());
        self
    }

    pub fn heartbeat(mut self, interval: Duration, timeout: Duration) -> Self {
        self.config.heartbeat_interval = interval;
        self.config.heartbeat_timeout = timeout;
        self
    }

    pub fn broadcast_capacity(mut self, capacity: usize) -> Self {
        self.config.broadcast_capacity = capacity;
        self
    }

    pub fn cookie_secure(mut self, secure: bool) -> Self {
        self.config.cookie_secure = secure;
        self
    }

    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        self.config.validated()
    }
}

/// Connect to PostgreSQL and run migrations
///
/// Returns `None` when `database_url` is unset or the connection fails; the
/// server then falls back to in-memory stores.
pub async fn load_database(database_url: Option<&str>) -> Option<PgPool> {
    let Some(database_url) = database_url else {
        tracing::warn!("DATABASE_URL not set. Using in-memory stores.");
        return None;
    };

    tracing::info!("Connecting to database...");
    let pool = match PgPool::connect(database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            tracing::warn!("Falling back to in-memory stores.");
            return None;
        }
    };

    tracing::info!("Running database migrations...");
    match sqlx::migrate!().run(&pool).await {
        Ok(_) => tracing::info!("Database migrations completed successfully"),
        Err(e) => {
            tracing::error!("Failed to run database migrations: {}", e);
            tracing::warn!("Continuing without migrations - database might not be up to date");
        }
    }

    Some(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ServerConfig::builder("secret").build().unwrap();
        assert_eq!(config.jwt_secret, "secret");
        assert_eq!(config.port, 3000);
        assert_eq!(config.token_ttl, chrono::Duration::days(7));
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(config.heartbeat_timeout, Duration::from_secs(90));
        assert_eq!(config.broadcast_capacity, 1024);
        assert!(!config.cookie_secure);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let config = ServerConfig::builder("secret")
            .port(8080)
            .client_url("http://localhost:5173")
            .heartbeat(Duration::from_secs(1), Duration::from_secs(3))
            .broadcast_capacity(8)
            .build()
            .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.client_url.as_deref(), Some("http://localhost:5173"));
        assert_eq!(config.heartbeat_timeout, Duration::from_secs(3));
        assert_eq!(config.broadcast_capacity, 8);
    }

    #[test]
    fn test_builder_rejects_zero_heartbeat_interval() {
        let err = ServerConfig::builder("secret")
            .heartbeat(Duration::ZERO, Duration::from_secs(90))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "HEARTBEAT_INTERVAL_SECS",
                value: "0".to_string(),
            }
        );
    }

    #[test]
    fn test_builder_rejects_timeout_shorter_than_interval() {
        let err = ServerConfig::builder("secret")
            .heartbeat(Duration::from_secs(30), Duration::from_secs(10))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "HEARTBEAT_TIMEOUT_SECS", .. }));
    }

    #[test]
    fn test_builder_rejects_zero_broadcast_capacity() {
        let err = ServerConfig::builder("secret").broadcast_capacity(0).build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "BROADCAST_CAPACITY", .. }));
    }

    // Environment variables are process-wide, so every env assertion lives
    // in this one test.
    #[test]
    fn test_from_env() {
        std::env::remove_var("JWT_SECRET");
        assert_eq!(ServerConfig::from_env().unwrap_err(), ConfigError::MissingValue("JWT_SECRET"));

        std::env::set_var("JWT_SECRET", "from-env");
        std::env::set_var("SERVER_PORT", "not-a-port");
        assert!(matches!(
            ServerConfig::from_env().unwrap_err(),
            ConfigError::InvalidValue { key: "SERVER_PORT", .. }
        ));

        std::env::set_var("SERVER_PORT", "4000");
        std::env::set_var("HEARTBEAT_INTERVAL_SECS", "0");
        assert_eq!(
            ServerConfig::from_env().unwrap_err(),
            ConfigError::InvalidValue {
                key: "HEARTBEAT_INTERVAL_SECS",
                value: "0".to_string(),
            }
        );

        std::env::remove_var("HEARTBEAT_INTERVAL_SECS");
        std::env::set_var("APP_ENV", "production");
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.jwt_secret, "from-env");
        assert_eq!(config.port, 4000);
        assert!(config.cookie_secure);

        std::env::remove_var("JWT_SECRET");
        std::env::remove_var("SERVER_PORT");
        std::env::remove_var("APP_ENV");
    }
}

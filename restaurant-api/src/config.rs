/// Configuration management for the API server
///
/// Configuration is read from environment variables (a `.env` file is loaded
/// first when present).
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: `*`)
/// - `STORAGE_BACKEND`: `postgres` or `memory` (default: postgres)
/// - `DATABASE_URL`: PostgreSQL connection string (required for postgres)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `STORE_OP_TIMEOUT_SECS`: Timeout for each storage operation (default: 100)
/// - `JWT_SECRET`: Token signing secret, at least 32 characters (required)
/// - `ACCESS_TOKEN_TTL_HOURS`: Access token lifetime, 1 to 87600 (default: 24)
/// - `REFRESH_TOKEN_TTL_HOURS`: Refresh token lifetime, 1 to 87600 (default: 168)
/// - `RUST_LOG`: Log filter (default: restaurant_api=debug,tower_http=debug)
///
/// # Example
///
/// ```no_run
/// use restaurant_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Minimum accepted length of `JWT_SECRET`
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Upper bound for either token lifetime (ten years)
pub const MAX_TOKEN_TTL_HOURS: i64 = 87_600;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub jwt: JwtConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `["*"]` allows any
    pub cors_origins: Vec<String>,
}

/// Which document store backs the collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => anyhow::bail!("Unknown STORAGE_BACKEND '{}' (expected postgres or memory)", other),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// PostgreSQL connection URL, present whenever `backend` is postgres
    pub database_url: Option<String>,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// Timeout applied to every storage operation
    pub operation_timeout_secs: u64,
}

impl StorageConfig {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for token signing
    ///
    /// Must be kept secret. Generate with: `openssl rand -hex 32`
    pub secret: String,

    pub access_ttl_hours: i64,
    pub refresh_ttl_hours: i64,
}

impl JwtConfig {
    pub fn access_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.access_ttl_hours)
    }

    pub fn refresh_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.refresh_ttl_hours)
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `JWT_SECRET` is missing or shorter than 32 characters
    /// - `DATABASE_URL` is missing while the postgres backend is selected
    /// - A numeric variable does not parse
    /// - A token lifetime is outside 1..=87600 hours
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "API_PORT", 8080u16)?;

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let backend = match lookup("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::Postgres,
        };

        let database_url = lookup("DATABASE_URL");
        if backend == StorageBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL environment variable is required for the postgres backend");
        }

        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;
        let operation_timeout_secs = parse_or(&lookup, "STORE_OP_TIMEOUT_SECS", 100u64)?;
        if operation_timeout_secs == 0 {
            anyhow::bail!("STORE_OP_TIMEOUT_SECS must be greater than zero");
        }

        let secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {} characters long", MIN_JWT_SECRET_LEN);
        }

        let access_ttl_hours = ttl_hours(&lookup, "ACCESS_TOKEN_TTL_HOURS", 24)?;
        let refresh_ttl_hours = ttl_hours(&lookup, "REFRESH_TOKEN_TTL_HOURS", 168)?;

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
            },
            storage: StorageConfig {
                backend,
                database_url,
                max_connections,
                operation_timeout_secs,
            },
            jwt: JwtConfig {
                secret,
                access_ttl_hours,
                refresh_ttl_hours,
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
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e)),
        None => Ok(default),
    }
}

/// Token lifetime in hours, between one hour and ten years
fn ttl_hours<F>(lookup: &F, key: &str, default: i64) -> anyhow::Result<i64>
where
    F: Fn(&str) -> Option<String>,
{
    let hours = parse_or(lookup, key, default)?;
    if !(1..=MAX_TOKEN_TTL_HOURS).contains(&hours) {
        anyhow::bail!("{} must be between 1 and {}", key, MAX_TOKEN_TTL_HOURS);
    }
    Ok(hours)
}

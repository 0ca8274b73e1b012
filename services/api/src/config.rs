//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub log_level: Level,
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Load Server and Database Settings ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => parse_positive("DB_MAX_CONNECTIONS", &raw)?,
            None => 5,
        };

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Token Settings ---
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| ConfigError::MissingVar("JWT_SECRET".to_string()))?;

        let access_token_ttl_minutes = match lookup("ACCESS_TOKEN_EXPIRE_MINUTES") {
            Some(raw) => parse_positive("ACCESS_TOKEN_EXPIRE_MINUTES", &raw)?,
            None => 30,
        };

        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:8000".to_string());

        Ok(Self {
            bind_address,
            database_url,
            db_max_connections,
            log_level,
            jwt_secret,
            access_token_ttl_minutes,
            cors_origin,
        })
    }
}

fn parse_positive<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    raw.trim()
        .parse::<T>()
        .ok()
        .filter(|value| *value > T::default())
        .ok_or_else(|| {
            ConfigError::InvalidValue(
                key.to_string(),
                format!("'{}' is not a positive integer", raw),
            )
        })
}

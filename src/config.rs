// src/config.rs

use std::env;
use std::fmt;
use std::net::SocketAddr;

use dotenvy::dotenv;

/// Default access token lifetime (1 hour).
pub const DEFAULT_JWT_EXPIRATION: u64 = 3600;

/// Default refresh token lifetime (7 days).
pub const DEFAULT_REFRESH_EXPIRATION: u64 = 7 * 24 * 3600;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres DSN. When absent the service runs on the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub refresh_expiration: u64,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    pub cors_origins: Vec<String>,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub admin_email: Option<String>,
}

/// Raised when the environment does not describe a usable configuration.
#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => write!(f, "{} has invalid value '{}'", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url = optional("DATABASE_URL");

        let jwt_secret = optional("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let jwt_expiration = parse_or("JWT_EXPIRATION", DEFAULT_JWT_EXPIRATION)?;
        let refresh_expiration = parse_or("JWT_REFRESH_EXPIRATION", DEFAULT_REFRESH_EXPIRATION)?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let bind_addr = parse_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8000)))?;

        let cors_origins = optional("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000,http://127.0.0.1:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            refresh_expiration,
            rust_log,
            bind_addr,
            cors_origins,
            admin_username: optional("ADMIN_USERNAME"),
            admin_password: optional("ADMIN_PASSWORD"),
            admin_email: optional("ADMIN_EMAIL"),
        })
    }

    /// Configuration used by tests and local tooling: in-memory store, short-lived tokens.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: None,
            jwt_secret: jwt_secret.to_string(),
            jwt_expiration: 600,
            refresh_expiration: 1200,
            rust_log: "error".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            cors_origins: vec!["http://localhost:3000".to_string()],
            admin_username: None,
            admin_password: None,
            admin_email: None,
        }
    }
}

/// Reads a variable, treating empty values as unset.
fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

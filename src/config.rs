//! Configuration module for environment variables and application settings

use std::env;
use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};

#[derive(Clone)]
pub struct Config {
    /// Symmetric secret used to sign and verify bearer tokens
    pub jwt_secret: String,

    /// Which credential store backs the service
    pub store_backend: StoreBackend,

    /// Database configuration, present for the postgres backend
    pub database: Option<DatabaseSettings>,

    /// Server configuration
    pub server: ServerConfig,

    /// When false the news routes are mounted without the auth gate and
    /// the author is taken from the request body
    pub require_auth: bool,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: usize,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::Postgres => "postgres",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            other => Err(anyhow!("unknown STORE_BACKEND '{}', expected memory or postgres", other)),
        }
    }
}

// Keep the secret out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("jwt_secret", &"<redacted>")
            .field("store_backend", &self.store_backend)
            .field("database", &self.database.as_ref().map(|d| d.max_connections))
            .field("server", &self.server)
            .field("require_auth", &self.require_auth)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| anyhow!("JWT_SECRET environment variable is required and must not be empty"))?;

        let database_url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty());

        let store_backend = match lookup("STORE_BACKEND") {
            Some(raw) => raw.parse::<StoreBackend>()?,
            None if database_url.is_some() => StoreBackend::Postgres,
            None => StoreBackend::Memory,
        };

        let database = match store_backend {
            StoreBackend::Postgres => {
                let url = database_url
                    .ok_or_else(|| anyhow!("DATABASE_URL must be set for the postgres backend"))?;
                Some(DatabaseSettings {
                    url,
                    max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 16)?,
                })
            }
            StoreBackend::Memory => None,
        };

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().with_context(|| format!("invalid PORT '{}'", raw))?,
            None => parse_or(&lookup, "SERVER_PORT", 8080)?,
        };

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let require_auth = match lookup("REQUIRE_AUTH") {
            Some(raw) => parse_bool(&raw).with_context(|| format!("invalid REQUIRE_AUTH '{}'", raw))?,
            None => true,
        };

        Ok(Self {
            jwt_secret,
            store_backend,
            database,
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port,
                cors_allowed_origins,
            },
            require_auth,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value '{}' for {}", raw, key)),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("expected a boolean"),
    }
}

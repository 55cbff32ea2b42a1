//! Process configuration, resolved once at startup and passed by reference.

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://todos.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const DEFAULT_CORS_ORIGINS: [&str; 5] = [
    "http://localhost:5173",
    "http://localhost:3000",
    "http://127.0.0.1:5173",
    "http://127.0.0.1:3000",
    "http://localhost:5174",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("unsupported database url: {0}")]
    UnsupportedUrl(String),
}

/// Which engine the deployment declares it runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbBackend {
    Sqlite,
    Postgresql,
}

impl DbBackend {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "postgresql" | "postgres" => Ok(Self::Postgresql),
            _ => Err(ConfigError::Invalid {
                key: "DB_BACKEND",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_backend: DbBackend,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub cors_origins: Vec<String>,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let db_backend = match var("DB_BACKEND") {
            Some(value) => DbBackend::parse(&value)?,
            None => DbBackend::Sqlite,
        };

        let cors_origins = match var("CORS_ORIGINS") {
            Some(value) => parse_cors_origins(&value)?,
            None => DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };

        let max_connections = match var("DB_MAX_CONNECTIONS") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "DB_MAX_CONNECTIONS",
                value,
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let port = match var("PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value })?,
            None => 8000,
        };

        Ok(Self {
            database_url,
            db_backend,
            supabase_url: var("SUPABASE_URL"),
            supabase_key: var("SUPABASE_KEY"),
            cors_origins,
            max_connections,
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
        })
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::Invalid {
            key: "HOST",
            value: raw,
        })
    }

    /// The hosted service is recognised by its connection string.
    pub fn is_hosted(&self) -> bool {
        is_hosted_url(&self.database_url)
    }
}

pub fn is_hosted_url(url: &str) -> bool {
    url.to_ascii_lowercase().contains("supabase")
}

/// Accepts `a, b, c` or a JSON list `["a", "b"]`.
pub fn parse_cors_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    let raw = raw.trim();
    if raw.starts_with('[') {
        return serde_json::from_str::<Vec<String>>(raw).map_err(|_| ConfigError::Invalid {
            key: "CORS_ORIGINS",
            value: raw.to_string(),
        });
    }

    Ok(raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}

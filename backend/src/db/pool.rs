//! Connection string resolution and pool construction.

use std::str::FromStr;
use std::sync::Arc;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{PgPool, SqlitePool};
use tracing::info;

use super::postgres::PgTodoStore;
use super::repository::TodoStore;
use super::sqlite::SqliteTodoStore;
use crate::config::{ConfigError, is_hosted_url};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
    Sqlite,
    Postgres,
    /// The hosted PostgreSQL-compatible service.
    Hosted,
}

/// Rewrites ORM-style URLs into the form sqlx understands.
///
/// * `postgresql+psycopg://…` and other `+driver` suffixes are dropped.
/// * `sqlite:///x.db` and `sqlite:///./x.db` are relative paths, `sqlite:////abs/x.db`
///   is absolute; each loses one slash.
/// * hosted URLs without an explicit `sslmode` get `sslmode=require`.
pub fn normalize_database_url(raw: &str) -> Result<String, ConfigError> {
    let raw = raw.trim();
    let (scheme, rest) = raw
        .split_once("://")
        .or_else(|| raw.split_once(':'))
        .ok_or_else(|| ConfigError::UnsupportedUrl(raw.to_string()))?;
    let base_scheme = scheme.split('+').next().unwrap_or(scheme);

    match base_scheme {
        "sqlite" => {
            let path = if raw[scheme.len()..].starts_with("://") {
                if let Some(absolute) = rest.strip_prefix("//") {
                    format!("/{absolute}")
                } else if let Some(relative) = rest.strip_prefix('/') {
                    relative.to_string()
                } else {
                    rest.to_string()
                }
            } else {
                // `sqlite::memory:` / `sqlite:todos.db`
                return Ok(format!("sqlite:{rest}"));
            };
            Ok(format!("sqlite://{path}"))
        }
        "postgres" | "postgresql" => {
            let mut url = format!("postgres://{rest}");
            if is_hosted_url(&url) && !url.contains("sslmode=") {
                let separator = if url.contains('?') { '&' } else { '?' };
                url.push(separator);
                url.push_str("sslmode=require");
            }
            Ok(url)
        }
        _ => Err(ConfigError::UnsupportedUrl(raw.to_string())),
    }
}

pub fn database_kind(url: &str) -> Result<DatabaseKind, ConfigError> {
    let normalized = normalize_database_url(url)?;
    if normalized.starts_with("sqlite:") {
        Ok(DatabaseKind::Sqlite)
    } else if is_hosted_url(&normalized) {
        Ok(DatabaseKind::Hosted)
    } else {
        Ok(DatabaseKind::Postgres)
    }
}

pub async fn connect_sqlite(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

    // Every connection to `:memory:` is its own database, so keep exactly one alive.
    if url.contains(":memory:") {
        return SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await;
    }

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// The hosted service sits behind a transaction-mode pooler, which cannot keep
/// named prepared statements across transactions.
pub async fn connect_postgres(
    url: &str,
    max_connections: u32,
    hosted: bool,
) -> Result<PgPool, sqlx::Error> {
    let mut options = PgConnectOptions::from_str(url)?;
    if hosted {
        options = options.statement_cache_capacity(0);
    }

    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// Opens a store for `raw_url`, choosing the engine from the URL scheme.
pub async fn connect(raw_url: &str, max_connections: u32) -> Result<Arc<dyn TodoStore>, AppError> {
    let url = normalize_database_url(raw_url)?;
    let kind = database_kind(&url)?;
    info!("connecting to {:?} database at {}", kind, redact(&url));

    let store: Arc<dyn TodoStore> = match kind {
        DatabaseKind::Sqlite => Arc::new(SqliteTodoStore::new(
            connect_sqlite(&url, max_connections).await?,
        )),
        DatabaseKind::Postgres => Arc::new(PgTodoStore::new(
            connect_postgres(&url, max_connections, false).await?,
        )),
        DatabaseKind::Hosted => Arc::new(PgTodoStore::new(
            connect_postgres(&url, max_connections, true).await?,
        )),
    };

    Ok(store)
}

/// Strips credentials for logging.
pub fn redact(url: &str) -> String {
    match (url.split_once("://"), url.rfind('@')) {
        (Some((scheme, _)), Some(at)) => format!("{}://***{}", scheme, &url[at..]),
        _ => url.to_string(),
    }
}

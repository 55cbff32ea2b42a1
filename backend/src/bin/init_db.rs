//! Creates the `todos` table in the configured database and, optionally,
//! copies an existing SQLite database into it.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use todo_backend::config::{AppConfig, DbBackend};
use todo_backend::db::{self, pool::redact};
use todo_backend::logging;
use todo_backend::migration::{self, MigrationError};

#[derive(Debug, Parser)]
#[command(about = "Initialize the database schema")]
struct Args {
    /// Copy todos from a local SQLite database once the schema exists
    #[arg(long)]
    migrate_from_sqlite: bool,

    /// Source database for --migrate-from-sqlite
    #[arg(long, default_value = "sqlite://./todos.db")]
    sqlite_url: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init("init_db=info,todo_backend=info");

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("init_db failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), MigrationError> {
    let config = AppConfig::from_env()?;
    info!("DB_BACKEND = {:?}", config.db_backend);
    info!("DATABASE_URL = {}", redact(&config.database_url));
    if let Some(url) = &config.supabase_url {
        info!(
            "SUPABASE_URL = {} (key {})",
            url,
            if config.supabase_key.is_some() { "set" } else { "not set" }
        );
    }

    let target = db::connect(&config.database_url, config.max_connections).await?;

    if config.is_hosted() {
        info!("Detected hosted database, using protected table creation");
    }
    let outcome = migration::bootstrap(target.as_ref(), config.is_hosted()).await?;
    info!("Schema bootstrap: {:?}", outcome);

    if args.migrate_from_sqlite {
        if config.db_backend != DbBackend::Postgresql {
            info!(
                "Skipping migration: DB_BACKEND is not 'postgresql'. \
                 Set DB_BACKEND=postgresql and DATABASE_URL to the PostgreSQL database first."
            );
        } else {
            migrate_from_sqlite(&args.sqlite_url, target.as_ref()).await?;
        }
    }

    info!("Done.");
    Ok(())
}

async fn migrate_from_sqlite(
    sqlite_url: &str,
    target: &dyn db::TodoStore,
) -> Result<(), MigrationError> {
    if db::database_kind(sqlite_url)? != db::DatabaseKind::Sqlite {
        info!("Skipping migration: source is not SQLite: {}", redact(sqlite_url));
        return Ok(());
    }

    info!("Starting migration from SQLite database at {}", sqlite_url);
    let source = db::connect(sqlite_url, 1).await?;
    source.ensure_schema().await?;

    let stats = migration::copy_todos(source.as_ref(), target).await?;
    info!(
        "Migrated {} of {} todos into configured database",
        stats.written, stats.read
    );

    if !stats.failed.is_empty() {
        let ids: Vec<i64> = stats.failed.iter().map(|f| f.id).collect();
        return Err(MigrationError::ValidationFailed(format!(
            "{} rows could not be written: {:?}",
            ids.len(),
            ids
        )));
    }

    Ok(())
}

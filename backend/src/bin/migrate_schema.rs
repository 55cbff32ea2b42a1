//! Adds the `priority`, `due_date` and `category` columns to an older `todos` table.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use todo_backend::config::AppConfig;
use todo_backend::db::{self, pool::redact};
use todo_backend::logging;
use todo_backend::migration::{self, MigrationError};

#[derive(Debug, Parser)]
#[command(about = "Add missing columns to the todos table")]
struct Args {
    /// Database to inspect (defaults to DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init("migrate_schema=info,todo_backend=info");

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Migration failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), MigrationError> {
    let config = AppConfig::from_env()?;
    let url = args.database_url.unwrap_or(config.database_url);
    info!("Checking schema for database: {}", redact(&url));

    let store = db::connect(&url, 1).await?;
    let added = migration::add_missing_columns(store.as_ref()).await?;

    if added.is_empty() {
        info!("Schema is up to date.");
    } else {
        let names: Vec<&str> = added.iter().map(|c| c.name()).collect();
        info!("Added columns: {}", names.join(", "));
    }
    Ok(())
}

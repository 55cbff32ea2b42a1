//! Copies every todo from a local PostgreSQL database to the hosted service,
//! then validates the copy.
//!
//! Stop the application (or put it in read-only mode) before running this.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use todo_backend::config::{AppConfig, is_hosted_url};
use todo_backend::db::{self, pool::redact};
use todo_backend::logging;
use todo_backend::migration::{self, MigrationError, VALIDATION_SAMPLE_SIZE};

#[derive(Debug, Parser)]
#[command(about = "Migrate todos from local PostgreSQL to the hosted database")]
struct Args {
    /// Source connection string
    #[arg(long, env = "LOCAL_POSTGRES_URL")]
    source: Option<String>,

    /// Target connection string (defaults to DATABASE_URL)
    #[arg(long)]
    target: Option<String>,

    /// Skip the confirmation prompts
    #[arg(long, short)]
    yes: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init("migrate_to_hosted=info,todo_backend=info");
    // LOCAL_POSTGRES_URL may come from .env
    dotenvy::dotenv().ok();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(MigrationError::Cancelled) => {
            println!("Migration cancelled.");
            ExitCode::FAILURE
        }
        Err(e @ MigrationError::ValidationFailed(_)) => {
            error!("{}", e);
            println!("Migration completed but validation failed. You may need to:");
            println!("  - clear the todos table on the hosted database and retry");
            println!("  - check the source for inconsistent rows");
            println!("  - review the connection settings");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Migration failed: {}", e);
            println!("Rollback guidance:");
            println!("  - the source database is unchanged");
            println!("  - the hosted database may hold partial data; review and clear it if needed");
            println!("  - check connection strings and network connectivity");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), MigrationError> {
    let source_url = args
        .source
        .ok_or(MigrationError::MissingSetting("LOCAL_POSTGRES_URL"))?;

    let config = AppConfig::from_env()?;
    let target_url = args.target.unwrap_or(config.database_url);

    if !is_hosted_url(&target_url) {
        warn!(
            "Target does not look like the hosted database: {}",
            redact(&target_url)
        );
        if !args.yes && !confirm("Continue anyway?")? {
            return Err(MigrationError::Cancelled);
        }
    }

    info!("Source: {}", redact(&source_url));
    info!("Target: {}", redact(&target_url));

    if !args.yes {
        println!("This will copy todos from the source into the target. Make sure:");
        println!("  1. the application is stopped or read-only");
        println!("  2. you have a backup of the source database");
        println!("  3. the target database is reachable");
        if !confirm("Proceed with migration?")? {
            return Err(MigrationError::Cancelled);
        }
    }

    let source = db::connect(&source_url, 1).await?;
    let target = db::connect(&target_url, 1).await?;

    migration::bootstrap(target.as_ref(), true).await?;

    let stats = migration::copy_todos(source.as_ref(), target.as_ref()).await?;
    if stats.read == 0 {
        info!("No todos to migrate.");
        return Ok(());
    }

    let outcome =
        migration::validate_copy(source.as_ref(), target.as_ref(), VALIDATION_SAMPLE_SIZE).await?;
    if !outcome.passed() {
        return Err(MigrationError::ValidationFailed(format!("{:?}", outcome)));
    }

    println!("Migration completed successfully: {} todos copied.", stats.written);
    println!("Next: point DATABASE_URL at the hosted database and restart the application.");
    Ok(())
}

fn confirm(question: &str) -> Result<bool, MigrationError> {
    print!("{} (yes/no): ", question);
    io::stdout().flush().map_err(|_| MigrationError::Cancelled)?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|_| MigrationError::Cancelled)?;

    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}

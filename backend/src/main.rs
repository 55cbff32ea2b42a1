use tokio::signal;
use tracing::info;

use todo_backend::api::router;
use todo_backend::config::AppConfig;
use todo_backend::state::AppState;
use todo_backend::{db, logging, migration};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init("todo_backend=debug,tower_http=info");

    let config = AppConfig::from_env()?;

    let store = db::connect(&config.database_url, config.max_connections).await?;
    migration::bootstrap(store.as_ref(), config.is_hosted()).await?;

    let addr = config.listen_addr()?;
    let state = AppState::new(store, config);

    let app = router(state);

    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}

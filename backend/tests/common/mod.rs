#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use todo_backend::config::AppConfig;
use todo_backend::db::{SqliteTodoStore, TodoStore, pool::connect_sqlite};
use todo_backend::state::AppState;

pub async fn memory_store() -> Arc<SqliteTodoStore> {
    let pool = connect_sqlite("sqlite::memory:", 1)
        .await
        .expect("Failed to create database");
    let store = SqliteTodoStore::new(pool);
    store.ensure_schema().await.expect("Failed to create schema");
    Arc::new(store)
}

pub fn test_config() -> AppConfig {
    let env: HashMap<&str, &str> = HashMap::from([
        ("DATABASE_URL", "sqlite::memory:"),
        ("CORS_ORIGINS", "http://localhost:5173"),
    ]);
    AppConfig::from_lookup(|key| env.get(key).map(|v| v.to_string())).expect("config")
}

pub async fn test_state() -> AppState {
    let store: Arc<dyn TodoStore> = memory_store().await;
    AppState::new(store, test_config())
}

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::TodoStore;
use crate::services::TodoService;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TodoStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn TodoStore>, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// A fresh service for the current request.
    pub fn todo_service(&self) -> TodoService {
        TodoService::new(self.store.clone())
    }
}

pub mod pool;
pub mod postgres;
pub mod repository;
pub mod sqlite;

pub use pool::{DatabaseKind, connect, database_kind, normalize_database_url};
pub use postgres::PgTodoStore;
pub use repository::{TODOS_TABLE, TodoColumn, TodoStore};
pub use sqlite::SqliteTodoStore;

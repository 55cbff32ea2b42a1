pub mod todo;

pub use todo::{
    DEFAULT_PRIORITY, MAX_DESCRIPTION_LEN, NewTodo, NewTodoRequest, Todo, TodoChanges, TodoFilter,
    UpdateTodoRequest,
};

pub mod types;
pub mod validate;

pub use types::{TodoItem, TodoRow, TodoStatus};
pub use validate::{parse_todo_payload, ValidationError};

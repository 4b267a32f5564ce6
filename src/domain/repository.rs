use async_trait::async_trait;

use super::error::TodoResult;
use super::todo::{CreateTodo, Todo, TodoId, UpdateTodo};

/// Storage contract shared by the durable and volatile backends.
///
/// Implementations own id assignment and timestamp bookkeeping. Absent ids
/// surface as `TodoError::NotFound`; engine failures as `TodoError::Backend`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    async fn create(&self, input: CreateTodo) -> TodoResult<Todo>;
    async fn get(&self, id: TodoId) -> TodoResult<Todo>;
    /// Newest first by `created_at`; ties fall back to descending id.
    async fn list(&self) -> TodoResult<Vec<Todo>>;
    async fn update(&self, id: TodoId, input: UpdateTodo) -> TodoResult<Todo>;
    async fn delete(&self, id: TodoId) -> TodoResult<()>;
    /// Removes every record. Reset flows only.
    async fn truncate(&self) -> TodoResult<()>;
}

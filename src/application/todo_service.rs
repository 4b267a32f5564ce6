use async_trait::async_trait;

use crate::domain::error::{TodoError, TodoResult};
use crate::domain::repository::TodoRepository;
use crate::domain::todo::{is_blank, CreateTodo, Todo, TodoId, UpdateTodo};

/// Validation and orchestration in front of a [`TodoRepository`].
///
/// Input rules live here so repository backends only deal with persistence.
#[async_trait]
pub trait TodoService: Send + Sync + 'static {
    async fn create(&self, input: CreateTodo) -> TodoResult<Todo>;
    async fn get(&self, id: TodoId) -> TodoResult<Todo>;
    async fn list(&self) -> TodoResult<Vec<Todo>>;
    async fn update(&self, id: TodoId, input: UpdateTodo) -> TodoResult<Todo>;
    async fn delete(&self, id: TodoId) -> TodoResult<()>;
    async fn truncate(&self) -> TodoResult<()>;
}

#[derive(Clone)]
pub struct TodoServiceImpl<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoServiceImpl<R> {
    pub fn new(repo: R) -> Self { Self { repo } }
}

fn validate_text(text: &str) -> TodoResult<()> {
    if is_blank(text) { Err(TodoError::empty_text()) } else { Ok(()) }
}

#[async_trait]
impl<R: TodoRepository> TodoService for TodoServiceImpl<R> {
    async fn create(&self, input: CreateTodo) -> TodoResult<Todo> {
        validate_text(&input.text)?;
        self.repo.create(input).await
    }

    async fn get(&self, id: TodoId) -> TodoResult<Todo> { self.repo.get(id).await }

    async fn list(&self) -> TodoResult<Vec<Todo>> { self.repo.list().await }

    async fn update(&self, id: TodoId, input: UpdateTodo) -> TodoResult<Todo> {
        validate_text(&input.text)?;
        // Load first: a missing id must read as NotFound, whatever the backend reports on a zero-row write.
        self.repo.get(id).await?;
        self.repo.update(id, input).await
    }

    async fn delete(&self, id: TodoId) -> TodoResult<()> { self.repo.delete(id).await }

    async fn truncate(&self) -> TodoResult<()> { self.repo.truncate().await }
}

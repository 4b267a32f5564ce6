use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::domain::{
    error::{TodoError, TodoResult},
    repository::TodoRepository,
    todo::{is_blank, CreateTodo, Todo, TodoId, UpdateTodo},
};

struct Store {
    /// Insertion order, which is also ascending `created_at`.
    todos: Vec<Todo>,
    next_id: i64,
}

/// Process-memory store. Clones share one store; separate `new()` calls never do.
#[derive(Clone)]
pub struct InMemoryTodoRepository {
    store: Arc<Mutex<Store>>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self { store: Arc::new(Mutex::new(Store { todos: Vec::new(), next_id: 1 })) }
    }
}

impl Default for InMemoryTodoRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn create(&self, input: CreateTodo) -> TodoResult<Todo> {
        if is_blank(&input.text) {
            return Err(TodoError::empty_text());
        }
        let mut store = self.store.lock().await;
        // Never earlier than the previous record, so reversed insertion order stays newest-first.
        let now = match store.todos.last() {
            Some(last) => Utc::now().max(last.created_at),
            None => Utc::now(),
        };
        let todo = Todo { id: TodoId(store.next_id), text: input.text, created_at: now, updated_at: now };
        store.next_id += 1;
        store.todos.push(todo.clone());
        tracing::debug!(id = %todo.id, "todo created");
        Ok(todo)
    }

    async fn get(&self, id: TodoId) -> TodoResult<Todo> {
        let store = self.store.lock().await;
        store.todos.iter().find(|t| t.id == id).cloned().ok_or(TodoError::NotFound(id))
    }

    async fn list(&self) -> TodoResult<Vec<Todo>> {
        let store = self.store.lock().await;
        Ok(store.todos.iter().rev().cloned().collect())
    }

    async fn update(&self, id: TodoId, input: UpdateTodo) -> TodoResult<Todo> {
        if is_blank(&input.text) {
            return Err(TodoError::empty_text());
        }
        let mut store = self.store.lock().await;
        let Some(todo) = store.todos.iter_mut().find(|t| t.id == id) else {
            return Err(TodoError::NotFound(id));
        };
        todo.text = input.text;
        todo.updated_at = Utc::now().max(todo.created_at);
        tracing::debug!(%id, "todo updated");
        Ok(todo.clone())
    }

    async fn delete(&self, id: TodoId) -> TodoResult<()> {
        let mut store = self.store.lock().await;
        let Some(pos) = store.todos.iter().position(|t| t.id == id) else {
            return Err(TodoError::NotFound(id));
        };
        store.todos.remove(pos);
        tracing::debug!(%id, "todo deleted");
        Ok(())
    }

    async fn truncate(&self) -> TodoResult<()> {
        let mut store = self.store.lock().await;
        let removed = store.todos.len();
        store.todos.clear();
        tracing::debug!(removed, "todos truncated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(text: &str) -> CreateTodo {
        CreateTodo { text: text.into() }
    }

    #[tokio::test]
    async fn ids_start_at_one_and_survive_deletes() {
        let repo = InMemoryTodoRepository::new();
        let first = repo.create(input("a")).await.unwrap();
        let second = repo.create(input("b")).await.unwrap();
        let third = repo.create(input("c")).await.unwrap();
        assert_eq!((first.id, second.id, third.id), (TodoId(1), TodoId(2), TodoId(3)));

        repo.delete(third.id).await.unwrap();
        let fourth = repo.create(input("d")).await.unwrap();
        assert_eq!(fourth.id, TodoId(4));

        repo.truncate().await.unwrap();
        let fifth = repo.create(input("e")).await.unwrap();
        assert_eq!(fifth.id, TodoId(5));
    }

    #[tokio::test]
    async fn separate_instances_do_not_share_state() {
        let a = InMemoryTodoRepository::new();
        let b = InMemoryTodoRepository::new();
        a.create(input("only in a")).await.unwrap();
        assert!(b.list().await.unwrap().is_empty());
        assert_eq!(b.create(input("first in b")).await.unwrap().id, TodoId(1));
    }

    #[tokio::test]
    async fn clones_share_one_store() {
        let a = InMemoryTodoRepository::new();
        let b = a.clone();
        let created = a.create(input("shared")).await.unwrap();
        assert_eq!(b.get(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn concurrent_creates_get_distinct_ids() {
        let repo = InMemoryTodoRepository::new();
        let handles: Vec<_> = (0..50)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.create(input(&format!("todo {i}"))).await.unwrap().id })
            })
            .collect();
        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap());
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 50);
        assert_eq!(repo.list().await.unwrap().len(), 50);
    }

    #[tokio::test]
    async fn blank_text_is_rejected_without_consuming_an_id() {
        let repo = InMemoryTodoRepository::new();
        assert!(matches!(repo.create(input("  ")).await, Err(TodoError::InvalidInput(_))));
        assert_eq!(repo.create(input("real")).await.unwrap().id, TodoId(1));
    }
}

use chrono::Utc;
use mockall::predicate::eq;

use super::todo_service::{TodoService, TodoServiceImpl};
use crate::domain::error::TodoError;
use crate::domain::repository::MockTodoRepository;
use crate::domain::todo::{CreateTodo, Todo, TodoId, UpdateTodo};
use crate::infrastructure::memory_repo::InMemoryTodoRepository;

fn sample(id: i64, text: &str) -> Todo {
    let now = Utc::now();
    Todo { id: TodoId(id), text: text.into(), created_at: now, updated_at: now }
}

#[tokio::test]
async fn unit_create_and_get() {
    let service = TodoServiceImpl::new(InMemoryTodoRepository::new());
    let created = service.create(CreateTodo { text: "milk".into() }).await.unwrap();
    assert_eq!(created.id, TodoId(1));
    assert_eq!(created.text, "milk");
    assert_eq!(created.created_at, created.updated_at);
    let got = service.get(created.id).await.unwrap();
    assert_eq!(got, created);
}

#[tokio::test]
async fn create_keeps_untrimmed_text() {
    let service = TodoServiceImpl::new(InMemoryTodoRepository::new());
    let created = service.create(CreateTodo { text: "  padded  ".into() }).await.unwrap();
    assert_eq!(created.text, "  padded  ");
}

#[tokio::test]
async fn blank_create_never_reaches_storage() {
    let mut repo = MockTodoRepository::new();
    repo.expect_create().never();
    let service = TodoServiceImpl::new(repo);

    for text in ["", "   ", "\n\t"] {
        let err = service.create(CreateTodo { text: text.into() }).await.unwrap_err();
        assert!(matches!(err, TodoError::InvalidInput(_)), "{text:?} should be rejected");
    }
}

#[tokio::test]
async fn blank_update_never_reaches_storage() {
    let mut repo = MockTodoRepository::new();
    repo.expect_get().never();
    repo.expect_update().never();
    let service = TodoServiceImpl::new(repo);

    let err = service.update(TodoId(1), UpdateTodo { text: " ".into() }).await.unwrap_err();
    assert!(matches!(err, TodoError::InvalidInput(_)));
}

#[tokio::test]
async fn update_of_missing_id_stops_after_lookup() {
    let mut repo = MockTodoRepository::new();
    repo.expect_get()
        .with(eq(TodoId(42)))
        .times(1)
        .returning(|id| Err(TodoError::NotFound(id)));
    repo.expect_update().never();
    let service = TodoServiceImpl::new(repo);

    let err = service.update(TodoId(42), UpdateTodo { text: "bread".into() }).await.unwrap_err();
    assert!(matches!(err, TodoError::NotFound(TodoId(42))));
}

#[tokio::test]
async fn update_loads_then_writes() {
    let mut repo = MockTodoRepository::new();
    let mut seq = mockall::Sequence::new();
    repo.expect_get()
        .with(eq(TodoId(1)))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|id| Ok(sample(id.0, "milk")));
    repo.expect_update()
        .with(eq(TodoId(1)), eq(UpdateTodo { text: "bread".into() }))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|id, input| Ok(sample(id.0, &input.text)));
    let service = TodoServiceImpl::new(repo);

    let updated = service.update(TodoId(1), UpdateTodo { text: "bread".into() }).await.unwrap();
    assert_eq!(updated.text, "bread");
}

#[tokio::test]
async fn backend_errors_pass_through() {
    let mut repo = MockTodoRepository::new();
    repo.expect_list().returning(|| Err(TodoError::Backend(anyhow::anyhow!("disk on fire"))));
    repo.expect_delete().returning(|_| Err(TodoError::Backend(anyhow::anyhow!("connection lost"))));
    let service = TodoServiceImpl::new(repo);

    let err = service.list().await.unwrap_err();
    assert!(matches!(err, TodoError::Backend(_)));
    assert_eq!(err.to_string(), "disk on fire");
    assert!(matches!(service.delete(TodoId(1)).await, Err(TodoError::Backend(_))));
}

#[tokio::test]
async fn update_preserves_created_at() {
    let service = TodoServiceImpl::new(InMemoryTodoRepository::new());
    let created = service.create(CreateTodo { text: "milk".into() }).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let updated = service.update(created.id, UpdateTodo { text: "bread".into() }).await.unwrap();
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.created_at);
    assert_eq!(service.get(created.id).await.unwrap().text, "bread");
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let service = TodoServiceImpl::new(InMemoryTodoRepository::new());
    let created = service.create(CreateTodo { text: "milk".into() }).await.unwrap();
    service.delete(created.id).await.unwrap();

    assert!(matches!(service.get(created.id).await, Err(TodoError::NotFound(_))));
    assert!(matches!(service.delete(created.id).await, Err(TodoError::NotFound(_))));
    assert!(matches!(service.delete(TodoId(999)).await, Err(TodoError::NotFound(_))));
}

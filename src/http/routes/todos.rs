use axum::body::Bytes;
use axum::extract::{rejection::JsonRejection, Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;

use crate::application::todo_service::TodoService;
use crate::domain::todo::{CreateTodo, Todo, TodoId, UpdateTodo};
use crate::http::types::ApiError;

#[derive(Clone)]
pub struct AppState<S: TodoService> { pub service: S }

/// `enable_reset` adds `DELETE /api/todos`, which wipes the store.
pub fn router<S: TodoService + Clone + Send + Sync + 'static>(state: AppState<S>, enable_reset: bool) -> Router {
    let collection = post(create_todo::<S>).get(list_todos::<S>);
    let collection = if enable_reset { collection.delete(truncate_todos::<S>) } else { collection };
    Router::new()
        .route("/api/todos", collection)
        .route("/api/todos/:id", get(get_todo::<S>).put(update_todo::<S>).delete(delete_todo::<S>))
        .with_state(state)
}

async fn create_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    payload: Result<Json<CreateTodo>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let Json(input) = payload?;
    let todo = state.service.create(input).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn list_todos<S: TodoService>(State(state): State<AppState<S>>) -> Result<Json<Vec<Todo>>, ApiError> {
    Ok(Json(state.service.list().await?))
}

async fn get_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<Json<Todo>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.service.get(id).await?))
}

/// Unlike create, the body is read as JSON whatever the Content-Type says.
async fn update_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Todo>, ApiError> {
    let id = parse_id(&id)?;
    let input: UpdateTodo = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")))?;
    Ok(Json(state.service.update(id, input).await?))
}

async fn delete_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn truncate_todos<S: TodoService>(State(state): State<AppState<S>>) -> Result<StatusCode, ApiError> {
    state.service.truncate().await?;
    tracing::info!("all todos removed via reset route");
    Ok(StatusCode::NO_CONTENT)
}

fn parse_id(s: &str) -> Result<TodoId, ApiError> {
    s.parse::<i64>().map(TodoId).map_err(|_| ApiError::bad_request("invalid id"))
}

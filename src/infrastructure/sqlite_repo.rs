use std::{future::Future, path::Path, str::FromStr, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
    Row,
};
use tokio::task::JoinError;

use crate::domain::{
    error::{TodoError, TodoResult},
    repository::TodoRepository,
    todo::{is_blank, CreateTodo, Todo, TodoId, UpdateTodo},
};

/// AUTOINCREMENT keeps ids from being handed out again after deletes or a truncate.
const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS todos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

const COLUMNS: &str = "id, text, created_at, updated_at";

/// SQLite-backed store holding a single long-lived connection.
///
/// The handle is acquired in [`connect`](Self::connect) and must be released
/// with [`close`](Self::close) once the owner shuts down.
#[derive(Clone)]
pub struct SqliteTodoRepository {
    pool: SqlitePool,
}

impl SqliteTodoRepository {
    /// Opens (creating if needed) the database file at `path` and applies the schema.
    pub async fn connect(path: impl AsRef<Path>) -> TodoResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating database directory {}", parent.display()))?;
            }
        }
        let options = SqliteConnectOptions::new().filename(path).create_if_missing(true);
        let repo = Self::connect_with(options).await?;
        tracing::info!(path = %path.display(), "sqlite store opened");
        Ok(repo)
    }

    /// Private in-memory database, gone once the repository is closed or dropped.
    pub async fn connect_in_memory() -> TodoResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let repo = Self::connect_with(options).await?;
        tracing::info!("sqlite in-memory store opened");
        Ok(repo)
    }

    async fn connect_with(options: SqliteConnectOptions) -> TodoResult<Self> {
        // One connection, never recycled: an in-memory database lives only as long as it does.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;
        let repo = Self { pool };
        if let Err(err) = repo.migrate().await {
            repo.close().await;
            return Err(err);
        }
        Ok(repo)
    }

    async fn migrate(&self) -> TodoResult<()> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Releases the underlying connection. Later calls on this handle fail with a backend error.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("sqlite store closed");
    }

    /// Runs `work` on its own task with a handle to this store, then closes the store.
    /// The close happens whether `work` finishes or panics; a panic comes back as the `JoinError`.
    pub async fn run_then_close<F, Fut, T>(&self, work: F) -> Result<T, JoinError>
    where
        F: FnOnce(Self) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let outcome = tokio::spawn(work(self.clone())).await;
        if let Err(err) = &outcome {
            tracing::error!(error = %err, "store owner task ended abnormally");
        }
        self.close().await;
        outcome
    }
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    async fn create(&self, input: CreateTodo) -> TodoResult<Todo> {
        if is_blank(&input.text) {
            return Err(TodoError::empty_text());
        }
        let now = encode_timestamp(Utc::now());
        let row = sqlx::query(&format!(
            "INSERT INTO todos (text, created_at, updated_at) VALUES (?1, ?2, ?2) RETURNING {COLUMNS}"
        ))
        .bind(&input.text)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;
        let todo = row_to_todo(&row)?;
        tracing::debug!(id = %todo.id, "todo created");
        Ok(todo)
    }

    async fn get(&self, id: TodoId) -> TodoResult<Todo> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM todos WHERE id = ?1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => row_to_todo(&row),
            None => Err(TodoError::NotFound(id)),
        }
    }

    async fn list(&self) -> TodoResult<Vec<Todo>> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM todos ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_todo).collect()
    }

    async fn update(&self, id: TodoId, input: UpdateTodo) -> TodoResult<Todo> {
        if is_blank(&input.text) {
            return Err(TodoError::empty_text());
        }
        // MAX keeps updated_at >= created_at even if the clock stepped back.
        let row = sqlx::query(&format!(
            "UPDATE todos SET text = ?2, updated_at = MAX(?3, created_at) WHERE id = ?1 RETURNING {COLUMNS}"
        ))
        .bind(id.0)
        .bind(&input.text)
        .bind(encode_timestamp(Utc::now()))
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else { return Err(TodoError::NotFound(id)) };
        tracing::debug!(%id, "todo updated");
        row_to_todo(&row)
    }

    async fn delete(&self, id: TodoId) -> TodoResult<()> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(TodoError::NotFound(id));
        }
        tracing::debug!(%id, "todo deleted");
        Ok(())
    }

    async fn truncate(&self) -> TodoResult<()> {
        let result = sqlx::query("DELETE FROM todos").execute(&self.pool).await?;
        tracing::debug!(removed = result.rows_affected(), "todos truncated");
        Ok(())
    }
}

/// Fixed-width UTC text, so lexical order in SQL matches chronological order.
fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_timestamp(raw: &str) -> TodoResult<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("malformed stored timestamp {raw:?}"))?;
    Ok(parsed.with_timezone(&Utc))
}

fn row_to_todo(row: &SqliteRow) -> TodoResult<Todo> {
    let id: i64 = row.try_get("id")?;
    let text: String = row.try_get("text")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Todo {
        id: TodoId(id),
        text,
        created_at: decode_timestamp(&created_at)?,
        updated_at: decode_timestamp(&updated_at)?,
    })
}

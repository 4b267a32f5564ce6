use anyhow::Context;
use todo_api::application::todo_service::TodoServiceImpl;
use todo_api::config::{Config, Storage};
use todo_api::domain::repository::TodoRepository;
use todo_api::http::routing::{self, todos};
use todo_api::infrastructure::{memory_repo::InMemoryTodoRepository, sqlite_repo::SqliteTodoRepository};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env().context("reading configuration")?;
    match &config.storage {
        Storage::Durable(path) => {
            let repo = SqliteTodoRepository::connect(path)
                .await
                .with_context(|| format!("opening database {}", path.display()))?;
            let server_config = config.clone();
            repo.run_then_close(move |repo| async move { serve(&server_config, repo).await })
                .await
                .context("server task panicked")?
        }
        Storage::Volatile => {
            tracing::warn!("using volatile in-memory store; todos are lost on exit");
            serve(&config, InMemoryTodoRepository::new()).await
        }
    }
}

async fn serve<R: TodoRepository + Clone>(config: &Config, repo: R) -> anyhow::Result<()> {
    let service = TodoServiceImpl::new(repo);
    let todos_router = todos::router(todos::AppState { service }, config.enable_reset);
    let router = routing::app(todos_router);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, reset_route = config.enable_reset, "listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::ctrl_c;
    let _ = ctrl_c().await;
    tracing::info!("shutdown");
}

use anyhow::Context;
use axum::Router;
use mapkeeper::prelude::*;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting mapkeeper server...");

    // 1. Configuration from the environment (and .env)
    let settings = ConfigService::from_env();
    let config = RuntimeConfig::from_service(&settings).context("invalid configuration")?;
    tracing::info!(
        "Maps directory: {} (idle timeout {:?})",
        config.base_dir.display(),
        config.idle_timeout
    );

    // 2. Runtime manager; nothing is loaded until the first request
    let pool = WorkerPool::with_cpu_count().context("failed to start worker pool")?;
    let manager = RuntimeManager::builder()
        .config(config)
        .store(Arc::new(JsonMapStore::new(pool)))
        .build()
        .context("failed to build runtime manager")?;

    // 3. Router
    let app = Router::new()
        .merge(mapkeeper::controller::router(manager.clone()))
        .layer(TraceLayer::new_for_http());

    // 4. Serve with graceful shutdown
    let host = settings.get_or("HOST", "0.0.0.0");
    let port = settings.get_or("PORT", "3000");
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Server running on http://{}", addr);

    let shutdown_handler = ShutdownHandler::new(manager);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_handler.wait_for_shutdown().await;
        })
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

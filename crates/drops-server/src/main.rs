use std::sync::Arc;

use drops_server::{AppState, ServerConfig, Storage, router};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "drops_server=debug,drops_core=debug,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let storage = Arc::new(Storage::new(config.storage_dir.clone()).await?);

    let state = AppState {
        storage,
        field: config.field.clone(),
        max_body_bytes: config.max_body_bytes,
    };
    let app = router(state);

    let addr = config.addr()?;
    info!("Drops receiver listening on {}", addr);
    info!(
        "Expecting field {:?}, body limit {} MB",
        config.field,
        config.max_body_bytes / (1024 * 1024)
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}

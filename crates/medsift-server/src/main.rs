//! MedSift — biomedical corpus analysis server.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use medsift_server::routes::build_router;
use medsift_server::state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("MEDSIFT_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = medsift_core::MedsiftConfig::from_env(&data_dir)?;
    let port = config.port;

    let store = Arc::new(
        medsift_store::SqliteStore::open(&config.data_paths.corpus)
            .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?,
    );

    let state = Arc::new(AppState::new(config, store));

    // Periodic analysis passes run in the background from startup.
    state.scheduler.start();

    let app = build_router(state.clone());

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("MedSift server listening on {}", addr);

    let shutdown_state = state.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
            // Stops the scheduler loop; an in-flight pass finishes its
            // current unit instead of aborting mid-write.
            shutdown_state.scheduler.stop();
        })
        .await?;

    Ok(())
}

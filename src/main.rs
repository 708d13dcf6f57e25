use std::net::SocketAddr;

use tokio::signal;

use vocab_backend::config::Config;
use vocab_backend::logging::{init_tracing, LogConfig};
use vocab_backend::routes::build_router;
use vocab_backend::state::AppState;
use vocab_backend::store::Store;
use vocab_backend::workers::WorkerManager;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    init_tracing(&LogConfig {
        log_level: config.log_level.clone(),
        enable_file_logs: config.enable_file_logs,
        log_dir: config.log_dir.clone(),
    });
    tracing::info!(?config, "Starting vocab-backend");

    let store = Store::open(&config.sled_path)?;
    store.run_migrations()?;

    let addr = SocketAddr::new(config.host, config.port);
    let is_leader = config.worker.is_leader;
    let state = AppState::new(store, config);

    let workers = if is_leader {
        Some(WorkerManager::start(state.clone()).await?)
    } else {
        tracing::info!("Not the worker leader, skipping scheduled jobs");
        None
    };

    let app = build_router(state.clone());
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    let shutdown_tx = state.shutdown_tx.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    if let Some(workers) = workers {
        workers.shutdown().await;
    }
    state.store.flush()?;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal(shutdown_tx: tokio::sync::broadcast::Sender<()>) {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(error) => tracing::error!(%error, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::cli::ServerArgs;
use clipbox::api::{router, state::AppState};
use clipbox::config::Config;
use clipbox::downloader::YtDlp;
use clipbox::engine::Engine;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub async fn run(args: ServerArgs) -> Result<(), AnyError> {
    info!("Loading configuration");
    let mut config = Config::load().map_err(|e| format!("Failed to load config: {}", e))?;

    if let Some(address) = args.address {
        config.server.bind_addr = address;
    }
    if let Some(concurrency) = args.concurrency {
        config.worker.concurrency = concurrency;
    }
    config.validate()?;

    let downloader = Arc::new(YtDlp::new(config.downloader.clone()));
    let engine = Arc::new(Engine::new(&config, downloader));
    engine.start().await;

    let address = config.server.bind_addr;
    let app = router(AppState::new(config, engine.clone()));

    let listener = TcpListener::bind(address).await?;
    info!(%address, "clipbox listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // HTTP is closed; let running downloads finish before exiting
    engine.shutdown().await;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

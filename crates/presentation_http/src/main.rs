//! MimicDB standalone server
//!
//! Runs the embeddable façade as its own process, for test setups that want
//! the server outside the test runner.

use std::sync::Arc;

use infrastructure::{AppConfig, NativeLibraryBootstrap, StorageBootstrap};
use presentation_http::MimicServer;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mimicdb_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("MimicDB v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    let mut server = if config.server.port == 0 {
        MimicServer::new()?
    } else {
        MimicServer::with_port(config.server.port)
    };

    if let Some(accelerator) = &config.accelerator {
        let mut bootstrap = NativeLibraryBootstrap::new(accelerator.library_stem.clone());
        if let Some(root) = &accelerator.search_root {
            bootstrap = bootstrap.with_search_root(root.clone());
        }
        let bootstrap: Arc<dyn StorageBootstrap> = Arc::new(bootstrap);
        server = server.with_bootstrap(bootstrap);
    }

    server.start().await?;
    info!("Server listening on {}", server.endpoint());

    shutdown_signal().await;
    server.stop().await?;
    info!("Server shutdown complete");

    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        // Log error but continue waiting - this is a best-effort signal handler
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        () = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

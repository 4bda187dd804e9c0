use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use redline_core::{
    load_config, validate_config, ContentServer, OtcsClient, ProcessViewerFactory, Workspace,
};
use redline_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("REDLINE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Content server: {}", config.content_server.url);
    info!("Document node: {}", config.document.node_id);

    let server: Arc<dyn ContentServer> = Arc::new(
        OtcsClient::new(&config.content_server).context("Failed to create content server client")?,
    );
    let viewer_factory = ProcessViewerFactory::new(config.viewer.engine.clone());

    // Login, fetch and embed; any failure here stops startup
    let workspace = Arc::new(
        Workspace::start(&config, server, &viewer_factory)
            .await
            .context("Workspace startup failed")?,
    );

    let load_timeout = Duration::from_secs(config.viewer.load_timeout_secs);
    if workspace.wait_until_loaded(load_timeout).await {
        info!("Document loaded in viewer");
    } else {
        warn!(
            "Viewer did not report the document loaded within {}s; \
             triggers will be rejected until it does",
            load_timeout.as_secs()
        );
    }

    let state = Arc::new(AppState::new(config.clone(), Arc::clone(&workspace)));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    let shutdown_workspace = Arc::clone(&workspace);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let cancelled = shutdown_workspace.shutdown().await;
            if cancelled > 0 {
                info!("Cancelled {} in-flight operations", cancelled);
            }
        })
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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

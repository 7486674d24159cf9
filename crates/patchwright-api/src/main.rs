//! Patchwright API server
//!
//! HTTP surface plus the two queue workers, in one process. Exits 0 on a
//! clean SIGINT/SIGTERM shutdown, 1 on startup failure.

use patchwright_api::{bootstrap, routes};
use patchwright_config::{ApplicationConfig, Validate};
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Initialize environment (load .env, etc.)
    patchwright_common::initialize_environment();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting Patchwright API server...");

    // Load unified configuration with environment overrides
    let config = ApplicationConfig::from_env();
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {e}");
        std::process::exit(1);
    }
    info!(
        "Configuration loaded - API {}:{}, database {}",
        config.api.host,
        config.api.port,
        config.database.safe_connection_string()
    );

    // Initialize services and workers
    let services = match bootstrap::initialize_services(&config).await {
        Ok(services) => services,
        Err(e) => {
            error!("Startup failed: {e}");
            std::process::exit(1);
        }
    };

    let app = routes::create_router(services.state);

    let addr: SocketAddr = match format!("{}:{}", config.api.host, config.api.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid listen address: {e}");
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };
    info!("Listening on {addr}");

    let serve_result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Err(e) = serve_result {
        error!("Server error: {e}");
        std::process::exit(1);
    }

    // Stop the workers and wait for in-flight jobs to settle
    info!("Shutting down workers...");
    for signal in &services.shutdown_signals {
        signal.store(true, Ordering::Relaxed);
    }
    for handle in services.worker_handles {
        if let Err(e) = handle.await {
            error!("Worker task panicked during shutdown: {e}");
        }
    }
    services.reaper_handle.abort();

    info!("Shutdown complete");
}

/// Resolve on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("SIGINT received"),
        () = terminate => info!("SIGTERM received"),
    }
}

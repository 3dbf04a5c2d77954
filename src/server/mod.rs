//! Optional HTTP endpoint and process signal handling.
//!
//! This module provides:
//! - `/health` and `/metrics` served with axum
//! - Shutdown signal future shared by the poll loop

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tower_http::trace::TraceLayer;

mod rest;

pub use rest::{create_router, HealthResponse, ServerState};

use crate::Result;

/// Bind the metrics endpoint and serve it on a background task.
///
/// Binding happens before returning so address errors surface at startup.
///
/// # Errors
///
/// Returns an error if the address is invalid or cannot be bound.
pub async fn spawn_metrics_server(
    addr: &str,
    state: ServerState,
) -> Result<tokio::task::JoinHandle<()>> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| crate::Error::config(format!("invalid metrics address: {e}")))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let router = create_router(Arc::new(state)).layer(TraceLayer::new_for_http());

    tracing::info!(%addr, "Metrics endpoint listening");

    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(error = %e, "Metrics endpoint stopped");
        }
    }))
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C).
///
/// This function will block until one of the following signals is received:
/// - `SIGTERM` (Unix/Linux only)
/// - `SIGINT` (Ctrl+C on all platforms)
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, stopping");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, stopping");
        }
    }
}

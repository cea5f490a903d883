//! Fulfillment: HTTP services and background worker.
//!
//! Library half of the `sales-service` and `inventory-service` binaries so
//! that integration tests can build the same routers.

pub mod auth;
pub mod config;
pub mod error;
pub mod json;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod worker;

/// Resolves when the process receives Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

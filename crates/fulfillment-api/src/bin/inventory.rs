//! Inventory service entry point: HTTP API plus the stock decrement worker.

use std::error::Error;
use std::sync::Arc;

use fulfillment_api::config::InventoryConfig;
use fulfillment_api::routes;
use fulfillment_api::state::InventoryState;
use fulfillment_api::worker::StockDecrementWorker;
use fulfillment_api::{shutdown_signal, telemetry};
use fulfillment_core::clock::SystemClock;
use fulfillment_store::pg_message_channel::PgMessageChannel;
use fulfillment_store::pg_product_repository::PgProductRepository;
use fulfillment_store::schema;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = InventoryConfig::from_env()?;
    let telemetry = telemetry::init_tracing("inventory-service", config.otlp_endpoint.as_deref())?;

    tracing::info!("Starting inventory service");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    schema::migrate(&pool).await?;

    let channel_pool = if config.channel_database_url == config.database_url {
        pool.clone()
    } else {
        PgPoolOptions::new()
            .max_connections(5)
            .connect(&config.channel_database_url)
            .await?
    };

    let products = Arc::new(PgProductRepository::new(pool));
    let channel = PgMessageChannel::new(channel_pool).with_lease(config.channel_lease);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = StockDecrementWorker::new(Arc::new(channel), products.clone(), config.poll_interval);
    let worker_handle = tokio::spawn(worker.run(shutdown_rx));

    let app_state = InventoryState::new(Arc::new(SystemClock), products);

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::inventory_app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!(addr = %config.bind_addr, "Listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_tx.send_replace(true);
    worker_handle.await?;

    telemetry.shutdown();
    Ok(())
}

//! Sales service entry point.

use std::error::Error;
use std::sync::{Arc, Mutex};

use fulfillment_api::config::SalesConfig;
use fulfillment_api::routes;
use fulfillment_api::state::SalesState;
use fulfillment_api::{shutdown_signal, telemetry};
use fulfillment_core::clock::SystemClock;
use fulfillment_core::rng::SystemRng;
use fulfillment_sales::infrastructure::resilience::{CircuitBreaker, ResiliencePolicy};
use fulfillment_sales::infrastructure::stock_client::HttpStockQueryClient;
use fulfillment_store::pg_message_channel::PgMessageChannel;
use fulfillment_store::pg_order_repository::PgOrderRepository;
use fulfillment_store::schema;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = SalesConfig::from_env()?;
    let telemetry = telemetry::init_tracing("sales-service", config.otlp_endpoint.as_deref())?;

    tracing::info!("Starting sales service");

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

    let breaker = Arc::new(CircuitBreaker::new("inventory", config.breaker.clone()));
    let policy = ResiliencePolicy::new(
        config.retry.clone(),
        breaker,
        config.stock_query_timeout,
        Arc::new(Mutex::new(SystemRng::from_os())),
    );
    let stock = HttpStockQueryClient::new(
        reqwest::Client::builder().build()?,
        config.inventory_base_url.clone(),
        policy,
    );

    let app_state = SalesState::new(
        Arc::new(SystemClock),
        Arc::new(stock),
        Arc::new(PgOrderRepository::new(pool)),
        Arc::new(PgMessageChannel::new(channel_pool)),
        config.breaker.break_duration,
    );

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::sales_app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!(addr = %config.bind_addr, inventory = %config.inventory_base_url, "Listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    telemetry.shutdown();
    Ok(())
}

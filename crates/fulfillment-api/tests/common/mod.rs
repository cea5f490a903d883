//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use fulfillment_api::routes;
use fulfillment_api::state::{InventoryState, SalesState};
use fulfillment_api::worker::StockDecrementWorker;
use fulfillment_core::clock::Clock;
use fulfillment_sales::infrastructure::resilience::{
    CircuitBreaker, CircuitBreakerConfig, ResiliencePolicy, RetryConfig,
};
use fulfillment_sales::infrastructure::stock_client::HttpStockQueryClient;
use fulfillment_store::pg_message_channel::PgMessageChannel;
use fulfillment_store::pg_order_repository::PgOrderRepository;
use fulfillment_store::pg_product_repository::PgProductRepository;
use fulfillment_test_support::{FixedClock, MockRng};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

/// Bearer token sent on every test request.
pub const TOKEN: &str = "test-token";

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// Build the Inventory app on a real `PgProductRepository`.
pub fn build_inventory_app(pool: PgPool) -> Router {
    routes::inventory_app(InventoryState::new(
        fixed_clock(),
        Arc::new(PgProductRepository::new(pool)),
    ))
}

/// Serve the Inventory app on an ephemeral local port and return its base URL.
pub async fn spawn_inventory(pool: PgPool) -> String {
    let app = build_inventory_app(pool);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Build the Sales app against the Inventory service at `inventory_base_url`,
/// persisting orders and confirmations in `pool`.
pub fn build_sales_app(pool: PgPool, inventory_base_url: &str) -> Router {
    let policy = ResiliencePolicy::new(
        RetryConfig {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
            max_jitter: Duration::ZERO,
        },
        Arc::new(CircuitBreaker::new("inventory", CircuitBreakerConfig::default())),
        Duration::from_secs(5),
        Arc::new(Mutex::new(MockRng)),
    );
    let stock = HttpStockQueryClient::new(reqwest::Client::new(), inventory_base_url, policy);
    routes::sales_app(SalesState::new(
        fixed_clock(),
        Arc::new(stock),
        Arc::new(PgOrderRepository::new(pool.clone())),
        Arc::new(PgMessageChannel::new(pool)),
        CircuitBreakerConfig::default().break_duration,
    ))
}

/// A stock decrement worker reading the channel in `pool`.
pub fn build_worker(pool: PgPool) -> StockDecrementWorker {
    StockDecrementWorker::new(
        Arc::new(PgMessageChannel::new(pool.clone())),
        Arc::new(PgProductRepository::new(pool)),
        Duration::from_millis(10),
    )
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send an authenticated request with a JSON body and return the response.
pub async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {TOKEN}"))
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send an authenticated POST request with a JSON body.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send_json(app, "POST", uri, body).await
}

/// Send an authenticated GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", format!("Bearer {TOKEN}"))
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

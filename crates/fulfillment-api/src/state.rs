//! Shared application state for the two services.

use std::sync::Arc;
use std::time::Duration;

use fulfillment_core::channel::EventPublisher;
use fulfillment_core::clock::Clock;
use fulfillment_inventory::domain::repository::ProductRepository;
use fulfillment_sales::domain::repository::OrderRepository;
use fulfillment_sales::domain::stock::StockQuery;

/// State shared across Sales request handlers.
#[derive(Clone)]
pub struct SalesState {
    /// Clock for deterministic timestamps.
    pub clock: Arc<dyn Clock>,
    /// Stock availability lookups against Inventory.
    pub stock: Arc<dyn StockQuery>,
    /// Order persistence.
    pub orders: Arc<dyn OrderRepository>,
    /// Publisher for sale confirmations.
    pub publisher: Arc<dyn EventPublisher>,
    /// Wait advertised to clients when stock cannot be checked; the
    /// circuit break duration.
    pub stock_retry_after: Duration,
}

impl SalesState {
    /// Create new Sales state.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        stock: Arc<dyn StockQuery>,
        orders: Arc<dyn OrderRepository>,
        publisher: Arc<dyn EventPublisher>,
        stock_retry_after: Duration,
    ) -> Self {
        Self {
            clock,
            stock,
            orders,
            publisher,
            stock_retry_after,
        }
    }
}

/// State shared across Inventory request handlers.
#[derive(Clone)]
pub struct InventoryState {
    /// Clock for deterministic timestamps.
    pub clock: Arc<dyn Clock>,
    /// Product persistence.
    pub products: Arc<dyn ProductRepository>,
}

impl InventoryState {
    /// Create new Inventory state.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, products: Arc<dyn ProductRepository>) -> Self {
        Self { clock, products }
    }
}

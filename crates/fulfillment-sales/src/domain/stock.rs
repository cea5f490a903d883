//! The Sales view of Inventory stock.

use async_trait::async_trait;
use fulfillment_core::identity::CallerIdentity;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Point-in-time availability of a product, as reported by Inventory.
///
/// Used only to decide whether an order is accepted; never persisted and
/// never a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSnapshot {
    /// Product identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Current unit price in cents.
    pub price_cents: i64,
    /// Units currently on hand.
    pub quantity_on_hand: i32,
}

/// Outcome of a stock lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockLookup {
    /// The product exists; here is its availability.
    Found(StockSnapshot),
    /// Inventory does not know the product.
    NotFound,
    /// Inventory could not be reached or did not answer usefully.
    Unavailable(String),
}

/// Fetches product availability from Inventory.
#[async_trait]
pub trait StockQuery: Send + Sync {
    /// Fetches availability for one product on behalf of `caller`.
    async fn fetch(&self, product_id: Uuid, caller: &CallerIdentity) -> StockLookup;
}

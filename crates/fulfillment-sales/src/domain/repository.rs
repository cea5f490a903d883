//! Order persistence abstraction.

use async_trait::async_trait;
use fulfillment_core::error::DomainError;
use uuid::Uuid;

use super::order::Order;

/// Repository trait for storing and reading orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists an order together with all of its line items as one atomic
    /// unit: either everything is stored or nothing is.
    async fn insert(&self, order: &Order) -> Result<(), DomainError>;

    /// Loads one order with its line items.
    async fn find_by_id(&self, order_id: Uuid) -> Result<Option<Order>, DomainError>;

    /// Loads every order, newest first.
    async fn list(&self) -> Result<Vec<Order>, DomainError>;
}

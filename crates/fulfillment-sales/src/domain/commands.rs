//! Commands for the Sales context.

use uuid::Uuid;

/// Command to create an order from a list of requested items.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Requested items, in the order the caller listed them.
    pub items: Vec<OrderItemRequest>,
}

/// One requested product line.
#[derive(Debug, Clone, Copy)]
pub struct OrderItemRequest {
    /// The product to buy.
    pub product_id: Uuid,
    /// Units requested; must be at least 1.
    pub quantity: i32,
}

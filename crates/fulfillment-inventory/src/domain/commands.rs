//! Commands for the Inventory context.

use uuid::Uuid;

/// Command to register a new product.
#[derive(Debug, Clone)]
pub struct RegisterProduct {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Display name.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Unit price in cents.
    pub price_cents: i64,
    /// Initial units on hand.
    pub quantity_on_hand: i32,
}

/// Command to overwrite a product's quantity on hand.
#[derive(Debug, Clone)]
pub struct SetQuantity {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The product to adjust.
    pub product_id: Uuid,
    /// New absolute quantity.
    pub quantity: i32,
}

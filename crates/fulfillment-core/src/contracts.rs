//! Integration event contracts shared by the Sales and Inventory services.
//!
//! Field names are serialized in camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::channel::IntegrationEvent;

/// Channel carrying sale confirmations from Sales to Inventory.
pub const SALE_CONFIRMED_CHANNEL: &str = "estoque-baixar-quantidade";

/// Published once an order has been durably accepted. Inventory reacts by
/// decrementing stock for every listed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleConfirmed {
    /// The confirmed order.
    pub order_id: Uuid,
    /// When the sale was confirmed.
    pub confirmed_at_utc: DateTime<Utc>,
    /// Products and quantities sold, in order line order.
    pub items: Vec<ConfirmedItem>,
}

/// One product line of a confirmed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedItem {
    /// The product sold.
    pub product_id: Uuid,
    /// Units sold.
    pub quantity: i32,
}

impl IntegrationEvent for SaleConfirmed {
    const CHANNEL: &'static str = SALE_CONFIRMED_CHANNEL;
}

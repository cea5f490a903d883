//! The order aggregate.

use chrono::{DateTime, Utc};
use fulfillment_core::contracts::{ConfirmedItem, SaleConfirmed};
use fulfillment_core::error::DomainError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an order. Orders are created already confirmed and
/// no cancellation path exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Accepted, persisted, and announced to Inventory.
    Confirmed,
}

impl OrderStatus {
    /// The stored/serialized name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "Confirmed",
        }
    }

    /// Parses a stored status name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` for an unknown name, since only
    /// corrupted storage can produce one.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value {
            "Confirmed" => Ok(Self::Confirmed),
            other => Err(DomainError::Infrastructure(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

/// A validated product line ready to become an order line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    /// The product being bought.
    pub product_id: Uuid,
    /// Units bought.
    pub quantity: i32,
    /// Unit price captured from the stock snapshot at validation time.
    pub unit_price_cents: i64,
}

/// One line of an order.
///
/// The unit price is a snapshot taken when the order was placed, so later
/// price changes in Inventory never reprice historical orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineItem {
    /// Line item identifier.
    pub id: Uuid,
    /// The owning order, as a lookup key only.
    pub order_id: Uuid,
    /// The product bought (a reference into the Inventory service).
    pub product_id: Uuid,
    /// Units bought.
    pub quantity: i32,
    /// Unit price at order time, in cents.
    pub unit_price_cents: i64,
}

impl OrderLineItem {
    /// `quantity × unit_price_cents`, or `None` on overflow.
    #[must_use]
    pub fn subtotal_cents(&self) -> Option<i64> {
        i64::from(self.quantity).checked_mul(self.unit_price_cents)
    }
}

/// A confirmed order and its line items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Order identifier.
    pub id: Uuid,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
    /// Current status.
    pub status: OrderStatus,
    total_cents: i64,
    items: Vec<OrderLineItem>,
}

impl Order {
    /// Builds a confirmed order from validated lines. Line items keep the
    /// order of `lines`; the total is derived from them.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if there are no lines, a quantity
    /// is not positive, a price is negative, or the total overflows.
    pub fn confirm(
        id: Uuid,
        created_at: DateTime<Utc>,
        lines: &[PricedLine],
    ) -> Result<Self, DomainError> {
        if lines.is_empty() {
            return Err(DomainError::Validation(
                "an order requires at least one item".to_owned(),
            ));
        }

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            if line.quantity < 1 {
                return Err(DomainError::Validation(format!(
                    "quantity for product {} must be at least 1, got {}",
                    line.product_id, line.quantity
                )));
            }
            if line.unit_price_cents < 0 {
                return Err(DomainError::Validation(format!(
                    "unit price for product {} must not be negative",
                    line.product_id
                )));
            }
            items.push(OrderLineItem {
                id: Uuid::new_v4(),
                order_id: id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
            });
        }

        let total_cents = total_of(&items)?;

        Ok(Self {
            id,
            created_at,
            status: OrderStatus::Confirmed,
            total_cents,
            items,
        })
    }

    /// Rebuilds an order from storage without re-validating it.
    #[must_use]
    pub fn restore(
        id: Uuid,
        created_at: DateTime<Utc>,
        status: OrderStatus,
        total_cents: i64,
        items: Vec<OrderLineItem>,
    ) -> Self {
        Self {
            id,
            created_at,
            status,
            total_cents,
            items,
        }
    }

    /// Order total in cents.
    #[must_use]
    pub fn total_cents(&self) -> i64 {
        self.total_cents
    }

    /// Line items in the order they were requested.
    #[must_use]
    pub fn items(&self) -> &[OrderLineItem] {
        &self.items
    }

    /// Builds the integration event announcing this sale to Inventory.
    #[must_use]
    pub fn sale_confirmed(&self, confirmed_at: DateTime<Utc>) -> SaleConfirmed {
        SaleConfirmed {
            order_id: self.id,
            confirmed_at_utc: confirmed_at,
            items: self
                .items
                .iter()
                .map(|item| ConfirmedItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
        }
    }
}

fn total_of(items: &[OrderLineItem]) -> Result<i64, DomainError> {
    items.iter().try_fold(0_i64, |total, item| {
        item.subtotal_cents()
            .and_then(|subtotal| total.checked_add(subtotal))
            .ok_or_else(|| DomainError::Validation("order total is out of range".to_owned()))
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_confirm_derives_total_from_lines() {
        // Arrange
        let order_id = Uuid::new_v4();
        let lines = [
            PricedLine {
                product_id: Uuid::new_v4(),
                quantity: 2,
                unit_price_cents: 5_000,
            },
            PricedLine {
                product_id: Uuid::new_v4(),
                quantity: 3,
                unit_price_cents: 199,
            },
        ];

        // Act
        let order = Order::confirm(order_id, fixed_now(), &lines).unwrap();

        // Assert
        assert_eq!(order.total_cents(), 10_597);
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.items().len(), 2);
        let recomputed: i64 = order
            .items()
            .iter()
            .map(|i| i64::from(i.quantity) * i.unit_price_cents)
            .sum();
        assert_eq!(order.total_cents(), recomputed);
    }

    #[test]
    fn test_confirm_preserves_line_order_and_owner() {
        let order_id = Uuid::new_v4();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let lines = [
            PricedLine {
                product_id: first,
                quantity: 1,
                unit_price_cents: 10,
            },
            PricedLine {
                product_id: second,
                quantity: 1,
                unit_price_cents: 20,
            },
        ];

        let order = Order::confirm(order_id, fixed_now(), &lines).unwrap();

        assert_eq!(order.items()[0].product_id, first);
        assert_eq!(order.items()[1].product_id, second);
        assert!(order.items().iter().all(|i| i.order_id == order_id));
    }

    #[test]
    fn test_confirm_rejects_empty_lines() {
        let result = Order::confirm(Uuid::new_v4(), fixed_now(), &[]);

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_confirm_rejects_non_positive_quantity() {
        let lines = [PricedLine {
            product_id: Uuid::new_v4(),
            quantity: 0,
            unit_price_cents: 100,
        }];

        let result = Order::confirm(Uuid::new_v4(), fixed_now(), &lines);

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_confirm_rejects_overflowing_total() {
        let lines = [
            PricedLine {
                product_id: Uuid::new_v4(),
                quantity: i32::MAX,
                unit_price_cents: i64::MAX / 2,
            },
        ];

        let result = Order::confirm(Uuid::new_v4(), fixed_now(), &lines);

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_sale_confirmed_mirrors_line_items() {
        let order_id = Uuid::new_v4();
        let product_id = Uuid::new_v4();
        let lines = [PricedLine {
            product_id,
            quantity: 4,
            unit_price_cents: 250,
        }];
        let order = Order::confirm(order_id, fixed_now(), &lines).unwrap();

        let event = order.sale_confirmed(fixed_now());

        assert_eq!(event.order_id, order_id);
        assert_eq!(event.confirmed_at_utc, fixed_now());
        assert_eq!(event.items.len(), 1);
        assert_eq!(event.items[0].product_id, product_id);
        assert_eq!(event.items[0].quantity, 4);
    }

    #[test]
    fn test_status_round_trips_through_its_name() {
        assert_eq!(
            OrderStatus::parse(OrderStatus::Confirmed.as_str()).unwrap(),
            OrderStatus::Confirmed
        );
        assert!(OrderStatus::parse("Cancelled").is_err());
    }
}

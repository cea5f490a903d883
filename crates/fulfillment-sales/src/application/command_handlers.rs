//! Command handlers for the Sales context.
//!
//! Order creation is the one place where the accept/reject decision is
//! made: every requested item is checked against Inventory, in request
//! order, before anything is persisted.

use fulfillment_core::channel::{EventPublisher, publish_event};
use fulfillment_core::clock::Clock;
use fulfillment_core::error::DomainError;
use fulfillment_core::identity::CallerIdentity;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::commands::CreateOrder;
use crate::domain::order::{Order, PricedLine};
use crate::domain::repository::OrderRepository;
use crate::domain::stock::{StockLookup, StockQuery};

/// Why an order was not created.
#[derive(Debug, Error)]
pub enum OrderRejection {
    /// The request itself is malformed; no downstream call was made.
    #[error("validation error: {0}")]
    Validation(String),

    /// Inventory does not know a requested product.
    #[error("product {product_id} not found")]
    ProductNotFound {
        /// The unknown product.
        product_id: Uuid,
    },

    /// A product has fewer units on hand than requested.
    #[error(
        "insufficient stock for product '{product_name}': available {available}, requested {requested}"
    )]
    InsufficientStock {
        /// The short product.
        product_id: Uuid,
        /// Its display name.
        product_name: String,
        /// Units on hand when checked.
        available: i32,
        /// Units requested.
        requested: i32,
    },

    /// Inventory could not be consulted. Worth retrying later.
    #[error("stock check for product {product_id} is unavailable: {reason}")]
    StockUnavailable {
        /// The product being checked when the failure happened.
        product_id: Uuid,
        /// What went wrong downstream.
        reason: String,
    },

    /// Persistence or another infrastructure concern failed.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Result of a successfully created order.
#[derive(Debug)]
pub struct OrderCreated {
    /// The persisted order.
    pub order: Order,
    /// Identifier of the published sale confirmation, or `None` if
    /// publishing failed after the order was persisted.
    pub confirmation_id: Option<Uuid>,
}

fn validate(command: &CreateOrder) -> Result<(), OrderRejection> {
    if command.items.is_empty() {
        return Err(OrderRejection::Validation(
            "an order requires at least one item".to_owned(),
        ));
    }
    if let Some(item) = command.items.iter().find(|item| item.quantity < 1) {
        return Err(OrderRejection::Validation(format!(
            "quantity for product {} must be at least 1, got {}",
            item.product_id, item.quantity
        )));
    }
    Ok(())
}

/// Handles the `CreateOrder` command.
///
/// Checks every item sequentially in request order and stops at the first
/// failing one. Only when all items pass is the order built, persisted, and
/// announced with a `SaleConfirmed` event. A failed publish is logged and
/// does not undo the order.
///
/// # Errors
///
/// Returns `OrderRejection::Validation` for an empty request or a
/// non-positive quantity, `ProductNotFound`, `InsufficientStock`, or
/// `StockUnavailable` for the first failing item, and
/// `OrderRejection::Domain` if persisting the order fails.
pub async fn handle_create_order(
    command: &CreateOrder,
    caller: &CallerIdentity,
    clock: &dyn Clock,
    stock: &dyn StockQuery,
    orders: &dyn OrderRepository,
    publisher: &dyn EventPublisher,
) -> Result<OrderCreated, OrderRejection> {
    validate(command)?;

    let mut lines = Vec::with_capacity(command.items.len());
    for item in &command.items {
        let snapshot = match stock.fetch(item.product_id, caller).await {
            StockLookup::Found(snapshot) => snapshot,
            StockLookup::NotFound => {
                return Err(OrderRejection::ProductNotFound {
                    product_id: item.product_id,
                });
            }
            StockLookup::Unavailable(reason) => {
                return Err(OrderRejection::StockUnavailable {
                    product_id: item.product_id,
                    reason,
                });
            }
        };

        if item.quantity > snapshot.quantity_on_hand {
            return Err(OrderRejection::InsufficientStock {
                product_id: item.product_id,
                product_name: snapshot.name,
                available: snapshot.quantity_on_hand,
                requested: item.quantity,
            });
        }

        lines.push(PricedLine {
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price_cents: snapshot.price_cents,
        });
    }

    let order = Order::confirm(Uuid::new_v4(), clock.now(), &lines)?;
    orders.insert(&order).await?;

    info!(
        correlation_id = %command.correlation_id,
        order_id = %order.id,
        item_count = order.items().len(),
        total_cents = order.total_cents(),
        "order created"
    );

    let event = order.sale_confirmed(clock.now());
    let confirmation_id = match publish_event(publisher, &event).await {
        Ok(message_id) => {
            info!(order_id = %order.id, %message_id, "sale confirmation published");
            Some(message_id)
        }
        Err(e) => {
            error!(
                order_id = %order.id,
                error = %e,
                "sale confirmation publish failed; order persisted without stock decrement"
            );
            None
        }
    };

    Ok(OrderCreated {
        order,
        confirmation_id,
    })
}

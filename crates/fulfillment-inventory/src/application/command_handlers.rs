//! Command handlers for the Inventory context.
//!
//! The sale-confirmation handler is the consumer side of the stock
//! decrement: it is not idempotent, so a redelivered confirmation is applied
//! again.

use fulfillment_core::clock::Clock;
use fulfillment_core::contracts::SaleConfirmed;
use fulfillment_core::error::DomainError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::commands::{RegisterProduct, SetQuantity};
use crate::domain::product::Product;
use crate::domain::repository::ProductRepository;

/// One stock change applied while processing a sale confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockAdjustment {
    /// The adjusted product.
    pub product_id: Uuid,
    /// Quantity before this adjustment.
    pub previous: i32,
    /// Quantity after this adjustment.
    pub current: i32,
}

/// A non-fatal problem met while processing a sale confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecrementWarning {
    /// The product is not known to Inventory; the item was skipped.
    MissingProduct {
        /// The unknown product.
        product_id: Uuid,
        /// Units the confirmation asked to remove.
        quantity: i32,
    },
    /// More units were sold than were on hand; stock was clamped to zero.
    InsufficientStock {
        /// The oversold product.
        product_id: Uuid,
        /// Units on hand before the decrement.
        available: i32,
        /// Units the confirmation asked to remove.
        requested: i32,
    },
    /// The confirmation carried a non-positive quantity; the item was
    /// skipped.
    InvalidQuantity {
        /// The product named by the item.
        product_id: Uuid,
        /// The offending quantity.
        quantity: i32,
    },
}

/// What processing one sale confirmation did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockDecrementReport {
    /// Adjustments in confirmation item order.
    pub applied: Vec<StockAdjustment>,
    /// Warnings in confirmation item order.
    pub warnings: Vec<DecrementWarning>,
}

/// Result of overwriting a product's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityChanged {
    /// The adjusted product.
    pub product_id: Uuid,
    /// Quantity before the change.
    pub previous: i32,
    /// Quantity after the change.
    pub current: i32,
}

/// Handles a `SaleConfirmed` event: locks every referenced product in one
/// batch, decrements each item (clamping at zero), and writes back every
/// changed quantity in the same unit of work.
///
/// Missing products and oversold items produce warnings and do not stop the
/// remaining items from being applied.
///
/// # Errors
///
/// Returns the repository's error if the batch update fails; in that case
/// nothing from this event is persisted.
pub async fn handle_sale_confirmed(
    event: &SaleConfirmed,
    repo: &dyn ProductRepository,
) -> Result<StockDecrementReport, DomainError> {
    let mut product_ids: Vec<Uuid> = Vec::with_capacity(event.items.len());
    for item in &event.items {
        if !product_ids.contains(&item.product_id) {
            product_ids.push(item.product_id);
        }
    }

    let mut report = StockDecrementReport::default();
    repo.update_quantities(&product_ids, &mut |products: &mut [Product]| {
        report = apply_sale(event, products);
    })
    .await?;

    info!(
        order_id = %event.order_id,
        applied = report.applied.len(),
        warnings = report.warnings.len(),
        "sale confirmation applied to stock"
    );

    Ok(report)
}

fn apply_sale(event: &SaleConfirmed, products: &mut [Product]) -> StockDecrementReport {
    let mut report = StockDecrementReport::default();

    for item in &event.items {
        if item.quantity < 1 {
            warn!(
                order_id = %event.order_id,
                product_id = %item.product_id,
                quantity = item.quantity,
                "skipping sale item with non-positive quantity"
            );
            report.warnings.push(DecrementWarning::InvalidQuantity {
                product_id: item.product_id,
                quantity: item.quantity,
            });
            continue;
        }

        let Some(product) = products.iter_mut().find(|p| p.id == item.product_id) else {
            warn!(
                order_id = %event.order_id,
                product_id = %item.product_id,
                quantity = item.quantity,
                "product not found while decrementing stock"
            );
            report.warnings.push(DecrementWarning::MissingProduct {
                product_id: item.product_id,
                quantity: item.quantity,
            });
            continue;
        };

        let outcome = product.decrement(item.quantity);
        if outcome.clamped {
            warn!(
                order_id = %event.order_id,
                product_id = %item.product_id,
                available = outcome.previous,
                requested = item.quantity,
                "insufficient stock while decrementing, clamped to zero"
            );
            report.warnings.push(DecrementWarning::InsufficientStock {
                product_id: item.product_id,
                available: outcome.previous,
                requested: item.quantity,
            });
        }
        report.applied.push(StockAdjustment {
            product_id: item.product_id,
            previous: outcome.previous,
            current: outcome.current,
        });
    }

    report
}

/// Handles the `RegisterProduct` command.
///
/// # Errors
///
/// Returns `DomainError::Validation` for invalid product fields, or the
/// repository's error if persisting fails.
pub async fn handle_register_product(
    command: &RegisterProduct,
    clock: &dyn Clock,
    repo: &dyn ProductRepository,
) -> Result<Product, DomainError> {
    let product = Product::register(
        Uuid::new_v4(),
        &command.name,
        command.description.clone(),
        command.price_cents,
        command.quantity_on_hand,
        clock.now(),
    )?;
    repo.insert(&product).await?;

    info!(
        correlation_id = %command.correlation_id,
        product_id = %product.id,
        quantity_on_hand = product.quantity_on_hand(),
        "product registered"
    );

    Ok(product)
}

/// Handles the `SetQuantity` command.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the product does not exist,
/// `DomainError::Validation` for a negative quantity, or the repository's
/// error if persisting fails.
pub async fn handle_set_quantity(
    command: &SetQuantity,
    repo: &dyn ProductRepository,
) -> Result<QuantityChanged, DomainError> {
    let mut outcome: Option<Result<i32, DomainError>> = None;
    repo.update_quantities(&[command.product_id], &mut |products: &mut [Product]| {
        if let Some(product) = products.first_mut() {
            outcome = Some(product.set_quantity(command.quantity));
        }
    })
    .await?;
    let previous = outcome.ok_or(DomainError::NotFound(command.product_id))??;

    info!(
        correlation_id = %command.correlation_id,
        product_id = %command.product_id,
        previous,
        current = command.quantity,
        "product quantity set"
    );

    Ok(QuantityChanged {
        product_id: command.product_id,
        previous,
        current: command.quantity,
    })
}

//! The product stock record.

use chrono::{DateTime, Utc};
use fulfillment_core::error::DomainError;
use uuid::Uuid;

/// Longest accepted product name, in characters.
pub const MAX_NAME_CHARS: usize = 200;

/// Longest accepted product description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

/// A sellable product and its authoritative quantity on hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Product identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Current unit price in cents.
    pub price_cents: i64,
    /// When the product was registered.
    pub created_at: DateTime<Utc>,
    quantity_on_hand: i32,
}

/// Outcome of applying a sold quantity to a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decrement {
    /// Quantity before the decrement.
    pub previous: i32,
    /// Quantity after the decrement.
    pub current: i32,
    /// Whether the requested quantity exceeded what was on hand and the
    /// result was clamped to zero.
    pub clamped: bool,
}

impl Product {
    /// Registers a new product after validating its fields.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank name, a name longer than
    /// [`MAX_NAME_CHARS`], a description longer than
    /// [`MAX_DESCRIPTION_CHARS`], a price below one cent, or a negative
    /// quantity.
    pub fn register(
        id: Uuid,
        name: &str,
        description: Option<String>,
        price_cents: i64,
        quantity_on_hand: i32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation(
                "product name must not be blank".to_owned(),
            ));
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(DomainError::Validation(format!(
                "product name must be at most {MAX_NAME_CHARS} characters"
            )));
        }
        let description = description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());
        if let Some(d) = &description
            && d.chars().count() > MAX_DESCRIPTION_CHARS
        {
            return Err(DomainError::Validation(format!(
                "product description must be at most {MAX_DESCRIPTION_CHARS} characters"
            )));
        }
        if price_cents < 1 {
            return Err(DomainError::Validation(format!(
                "price must be at least 1 cent, got {price_cents}"
            )));
        }
        validate_quantity(quantity_on_hand)?;
        Ok(Self {
            id,
            name: name.to_owned(),
            description,
            price_cents,
            created_at,
            quantity_on_hand,
        })
    }

    /// Rebuilds a product from storage without validation.
    #[must_use]
    pub fn restore(
        id: Uuid,
        name: String,
        description: Option<String>,
        price_cents: i64,
        quantity_on_hand: i32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            price_cents,
            created_at,
            quantity_on_hand,
        }
    }

    /// Units currently on hand. Never negative.
    #[must_use]
    pub fn quantity_on_hand(&self) -> i32 {
        self.quantity_on_hand
    }

    /// Removes `quantity` sold units, clamping at zero.
    pub fn decrement(&mut self, quantity: i32) -> Decrement {
        let previous = self.quantity_on_hand;
        let remaining = previous.saturating_sub(quantity);
        let clamped = remaining < 0;
        self.quantity_on_hand = remaining.max(0);
        Decrement {
            previous,
            current: self.quantity_on_hand,
            clamped,
        }
    }

    /// Overwrites the quantity on hand and returns the previous value.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a negative quantity.
    pub fn set_quantity(&mut self, quantity: i32) -> Result<i32, DomainError> {
        validate_quantity(quantity)?;
        let previous = self.quantity_on_hand;
        self.quantity_on_hand = quantity;
        Ok(previous)
    }
}

fn validate_quantity(quantity: i32) -> Result<(), DomainError> {
    if quantity < 0 {
        return Err(DomainError::Validation(format!(
            "quantity must not be negative, got {quantity}"
        )));
    }
    Ok(())
}

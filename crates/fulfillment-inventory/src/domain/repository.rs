//! Product persistence abstraction.

use async_trait::async_trait;
use fulfillment_core::error::DomainError;
use uuid::Uuid;

use super::product::Product;

/// Repository trait for stock records.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Loads one product.
    async fn find_by_id(&self, product_id: Uuid) -> Result<Option<Product>, DomainError>;

    /// Loads every product ordered by name.
    async fn list(&self) -> Result<Vec<Product>, DomainError>;

    /// Stores a new product.
    async fn insert(&self, product: &Product) -> Result<(), DomainError>;

    /// Loads every product in `product_ids` and holds them exclusively while
    /// `apply` changes them, then writes back every changed quantity. The
    /// load, `apply` and the writes form one atomic unit: concurrent callers
    /// touching the same product are serialized, and nothing is written if
    /// the unit fails.
    ///
    /// Unknown IDs are absent from the slice handed to `apply`.
    async fn update_quantities(
        &self,
        product_ids: &[Uuid],
        apply: &mut (dyn for<'p> FnMut(&'p mut [Product]) + Send),
    ) -> Result<(), DomainError>;
}

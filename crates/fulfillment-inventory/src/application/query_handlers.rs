//! Query handlers for the Inventory context.

use fulfillment_core::error::DomainError;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::product::Product;
use crate::domain::repository::ProductRepository;

/// Read-only view of a product. This is also the body of the stock query
/// answered to the Sales service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductView {
    /// Product identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Unit price in cents.
    pub price_cents: i64,
    /// Units on hand.
    pub quantity_on_hand: i32,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            price_cents: product.price_cents,
            quantity_on_hand: product.quantity_on_hand(),
        }
    }
}

/// Retrieves a product by its ID.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if no product has the ID.
pub async fn get_product_by_id(
    product_id: Uuid,
    repo: &dyn ProductRepository,
) -> Result<ProductView, DomainError> {
    let product = repo
        .find_by_id(product_id)
        .await?
        .ok_or(DomainError::NotFound(product_id))?;
    Ok(ProductView::from(&product))
}

/// Lists every product ordered by name.
///
/// # Errors
///
/// Returns the repository's error if loading fails.
pub async fn list_products(repo: &dyn ProductRepository) -> Result<Vec<ProductView>, DomainError> {
    let mut products = repo.list().await?;
    products.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(products.iter().map(ProductView::from).collect())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;

    struct FixedProducts(Vec<Product>);

    #[async_trait]
    impl ProductRepository for FixedProducts {
        async fn find_by_id(&self, product_id: Uuid) -> Result<Option<Product>, DomainError> {
            Ok(self.0.iter().find(|p| p.id == product_id).cloned())
        }

        async fn list(&self) -> Result<Vec<Product>, DomainError> {
            Ok(self.0.clone())
        }

        async fn insert(&self, _product: &Product) -> Result<(), DomainError> {
            unimplemented!()
        }

        async fn update_quantities(
            &self,
            _product_ids: &[Uuid],
            _apply: &mut (dyn for<'p> FnMut(&'p mut [Product]) + Send),
        ) -> Result<(), DomainError> {
            unimplemented!()
        }
    }

    fn named(name: &str) -> Product {
        Product::restore(Uuid::new_v4(), name.to_owned(), None, 100, 1, Utc::now())
    }

    #[tokio::test]
    async fn test_get_product_by_id_returns_view() {
        let widget = named("Widget");
        let repo = FixedProducts(vec![widget.clone()]);

        let view = get_product_by_id(widget.id, &repo).await.unwrap();

        assert_eq!(view, ProductView::from(&widget));
    }

    #[tokio::test]
    async fn test_get_product_by_id_returns_not_found() {
        let id = Uuid::new_v4();

        let result = get_product_by_id(id, &FixedProducts(vec![])).await;

        assert!(matches!(result, Err(DomainError::NotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn test_list_products_sorts_by_name() {
        let repo = FixedProducts(vec![named("Gadget"), named("Anvil"), named("Widget")]);

        let views = list_products(&repo).await.unwrap();

        let names: Vec<&str> = views.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Anvil", "Gadget", "Widget"]);
    }
}

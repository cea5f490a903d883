//! `PostgreSQL` implementation of the `ProductRepository` trait.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use fulfillment_core::error::DomainError;
use fulfillment_inventory::domain::product::Product;
use fulfillment_inventory::domain::repository::ProductRepository;

use crate::infrastructure;

/// PostgreSQL-backed product repository.
#[derive(Debug, Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    /// Creates a new `PgProductRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    price_cents: i64,
    quantity_on_hand: i32,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product::restore(
            row.id,
            row.name,
            row.description,
            row.price_cents,
            row.quantity_on_hand,
            row.created_at,
        )
    }
}

const SELECT_PRODUCTS: &str =
    "SELECT id, name, description, price_cents, quantity_on_hand, created_at FROM products";

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn find_by_id(&self, product_id: Uuid) -> Result<Option<Product>, DomainError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{SELECT_PRODUCTS} WHERE id = $1"))
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(infrastructure)?;
        Ok(row.map(Product::from))
    }

    async fn list(&self) -> Result<Vec<Product>, DomainError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!("{SELECT_PRODUCTS} ORDER BY name, id"))
            .fetch_all(&self.pool)
            .await
            .map_err(infrastructure)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn insert(&self, product: &Product) -> Result<(), DomainError> {
        sqlx::query(
            r"
            INSERT INTO products
                (id, name, description, price_cents, quantity_on_hand, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.quantity_on_hand())
        .bind(product.created_at)
        .execute(&self.pool)
        .await
        .map_err(infrastructure)?;
        Ok(())
    }

    async fn update_quantities(
        &self,
        product_ids: &[Uuid],
        apply: &mut (dyn for<'p> FnMut(&'p mut [Product]) + Send),
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(infrastructure)?;

        // Row locks are taken in id order so concurrent units cannot deadlock.
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{SELECT_PRODUCTS} WHERE id = ANY($1) ORDER BY id FOR UPDATE"
        ))
        .bind(product_ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(infrastructure)?;

        let mut products: Vec<Product> = rows.into_iter().map(Product::from).collect();
        let loaded: HashMap<Uuid, i32> = products
            .iter()
            .map(|p| (p.id, p.quantity_on_hand()))
            .collect();

        apply(&mut products);

        for product in &products {
            if loaded.get(&product.id) == Some(&product.quantity_on_hand()) {
                continue;
            }
            let result = sqlx::query("UPDATE products SET quantity_on_hand = $2 WHERE id = $1")
                .bind(product.id)
                .bind(product.quantity_on_hand())
                .execute(&mut *tx)
                .await
                .map_err(infrastructure)?;
            if result.rows_affected() == 0 {
                return Err(DomainError::NotFound(product.id));
            }
        }

        tx.commit().await.map_err(infrastructure)
    }
}

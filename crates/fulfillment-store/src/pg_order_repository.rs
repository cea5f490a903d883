//! `PostgreSQL` implementation of the `OrderRepository` trait.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use fulfillment_core::error::DomainError;
use fulfillment_sales::domain::order::{Order, OrderLineItem, OrderStatus};
use fulfillment_sales::domain::repository::OrderRepository;

use crate::infrastructure;

/// PostgreSQL-backed order repository.
#[derive(Debug, Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    /// Creates a new `PgOrderRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_items(&self, order_ids: &[Uuid]) -> Result<Vec<ItemRow>, DomainError> {
        sqlx::query_as::<_, ItemRow>(
            r"
            SELECT id, order_id, product_id, quantity, unit_price_cents
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, line_number
            ",
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)
    }
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    status: String,
    total_cents: i64,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    unit_price_cents: i64,
}

impl From<ItemRow> for OrderLineItem {
    fn from(row: ItemRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price_cents: row.unit_price_cents,
        }
    }
}

fn restore(row: OrderRow, items: Vec<OrderLineItem>) -> Result<Order, DomainError> {
    Ok(Order::restore(
        row.id,
        row.created_at,
        OrderStatus::parse(&row.status)?,
        row.total_cents,
        items,
    ))
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(infrastructure)?;

        sqlx::query(
            r"
            INSERT INTO orders (id, created_at, status, total_cents)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(order.id)
        .bind(order.created_at)
        .bind(order.status.as_str())
        .bind(order.total_cents())
        .execute(&mut *tx)
        .await
        .map_err(infrastructure)?;

        for (line_number, item) in (1_i32..).zip(order.items()) {
            sqlx::query(
                r"
                INSERT INTO order_items
                    (id, order_id, line_number, product_id, quantity, unit_price_cents)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(item.id)
            .bind(order.id)
            .bind(line_number)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .execute(&mut *tx)
            .await
            .map_err(infrastructure)?;
        }

        tx.commit().await.map_err(infrastructure)
    }

    async fn find_by_id(&self, order_id: Uuid) -> Result<Option<Order>, DomainError> {
        let row = sqlx::query_as::<_, OrderRow>(
            "SELECT id, created_at, status, total_cents FROM orders WHERE id = $1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(infrastructure)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let items = self
            .load_items(&[order_id])
            .await?
            .into_iter()
            .map(OrderLineItem::from)
            .collect();
        restore(row, items).map(Some)
    }

    async fn list(&self) -> Result<Vec<Order>, DomainError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, created_at, status, total_cents FROM orders ORDER BY created_at DESC, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut items_by_order: HashMap<Uuid, Vec<OrderLineItem>> = HashMap::new();
        for item in self.load_items(&ids).await? {
            items_by_order
                .entry(item.order_id)
                .or_default()
                .push(OrderLineItem::from(item));
        }

        rows.into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.id).unwrap_or_default();
                restore(row, items)
            })
            .collect()
    }
}

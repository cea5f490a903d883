//! Query handlers for the Sales context.

use chrono::{DateTime, Utc};
use fulfillment_core::error::DomainError;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::order::{Order, OrderLineItem};
use crate::domain::repository::OrderRepository;

/// Read-only view of an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    /// The order identifier.
    pub id: Uuid,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
    /// Status name.
    pub status: &'static str,
    /// Order total in cents.
    pub total_cents: i64,
    /// Line items in request order.
    pub items: Vec<OrderItemView>,
}

/// Read-only view of an order line item.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemView {
    /// Line item identifier.
    pub id: Uuid,
    /// The product bought.
    pub product_id: Uuid,
    /// Units bought.
    pub quantity: i32,
    /// Unit price captured at order time, in cents.
    pub unit_price_cents: i64,
}

impl From<&OrderLineItem> for OrderItemView {
    fn from(item: &OrderLineItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price_cents: item.unit_price_cents,
        }
    }
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            created_at: order.created_at,
            status: order.status.as_str(),
            total_cents: order.total_cents(),
            items: order.items().iter().map(OrderItemView::from).collect(),
        }
    }
}

/// Retrieves an order by its ID.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if no order has the ID, or the
/// repository's error if loading fails.
pub async fn get_order_by_id(
    order_id: Uuid,
    repo: &dyn OrderRepository,
) -> Result<OrderView, DomainError> {
    let order = repo
        .find_by_id(order_id)
        .await?
        .ok_or(DomainError::NotFound(order_id))?;
    Ok(OrderView::from(&order))
}

/// Lists every order, newest first.
///
/// # Errors
///
/// Returns the repository's error if loading fails.
pub async fn list_orders(repo: &dyn OrderRepository) -> Result<Vec<OrderView>, DomainError> {
    let mut orders = repo.list().await?;
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders.iter().map(OrderView::from).collect())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::domain::order::PricedLine;

    #[derive(Debug, Default)]
    struct StaticOrders(Mutex<Vec<Order>>);

    #[async_trait]
    impl OrderRepository for StaticOrders {
        async fn insert(&self, order: &Order) -> Result<(), DomainError> {
            self.0.lock().unwrap().push(order.clone());
            Ok(())
        }

        async fn find_by_id(&self, order_id: Uuid) -> Result<Option<Order>, DomainError> {
            Ok(self.0.lock().unwrap().iter().find(|o| o.id == order_id).cloned())
        }

        async fn list(&self) -> Result<Vec<Order>, DomainError> {
            Ok(self.0.lock().unwrap().clone())
        }
    }

    fn order_at(created_at: DateTime<Utc>) -> Order {
        Order::confirm(
            Uuid::new_v4(),
            created_at,
            &[PricedLine {
                product_id: Uuid::new_v4(),
                quantity: 2,
                unit_price_cents: 150,
            }],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_order_by_id_returns_view() {
        // Arrange
        let order = order_at(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap());
        let repo = StaticOrders::default();
        repo.insert(&order).await.unwrap();

        // Act
        let view = get_order_by_id(order.id, &repo).await.unwrap();

        // Assert
        assert_eq!(view.id, order.id);
        assert_eq!(view.status, "Confirmed");
        assert_eq!(view.total_cents, 300);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].unit_price_cents, 150);
    }

    #[tokio::test]
    async fn test_get_order_by_id_returns_not_found() {
        let id = Uuid::new_v4();

        let result = get_order_by_id(id, &StaticOrders::default()).await;

        match result {
            Err(DomainError::NotFound(missing)) => assert_eq!(missing, id),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_orders_sorts_newest_first() {
        let base = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let older = order_at(base);
        let newer = order_at(base + Duration::minutes(5));
        let repo = StaticOrders::default();
        repo.insert(&older).await.unwrap();
        repo.insert(&newer).await.unwrap();

        let views = list_orders(&repo).await.unwrap();

        let ids: Vec<Uuid> = views.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }
}

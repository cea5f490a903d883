//! Integration tests for `PgOrderRepository`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use fulfillment_sales::domain::order::{Order, PricedLine};
use fulfillment_sales::domain::repository::OrderRepository;
use fulfillment_store::pg_order_repository::PgOrderRepository;
use sqlx::PgPool;
use uuid::Uuid;

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap() + Duration::minutes(minutes)
}

fn make_order(created_at: DateTime<Utc>, lines: &[(i32, i64)]) -> Order {
    let lines: Vec<PricedLine> = lines
        .iter()
        .map(|&(quantity, unit_price_cents)| PricedLine {
            product_id: Uuid::new_v4(),
            quantity,
            unit_price_cents,
        })
        .collect();
    Order::confirm(Uuid::new_v4(), created_at, &lines).unwrap()
}

// --- find_by_id ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_find_by_id_returns_none_for_unknown_order(pool: PgPool) {
    let repo = PgOrderRepository::new(pool);

    let found = repo.find_by_id(Uuid::new_v4()).await.unwrap();

    assert!(found.is_none());
}

// --- insert + find_by_id round-trip ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_insert_and_load_order_with_items_in_request_order(pool: PgPool) {
    // Arrange
    let repo = PgOrderRepository::new(pool);
    let order = make_order(at(0), &[(2, 5_000), (1, 199), (7, 1)]);

    // Act
    repo.insert(&order).await.unwrap();
    let loaded = repo.find_by_id(order.id).await.unwrap().unwrap();

    // Assert
    assert_eq!(loaded, order);
    assert_eq!(loaded.total_cents(), 10_206);
}

// --- atomicity ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_insert_failure_leaves_no_partial_order(pool: PgPool) {
    // Arrange: the second insert reuses line item IDs, so its item rows
    // violate the primary key after its order row was written.
    let repo = PgOrderRepository::new(pool.clone());
    let first = make_order(at(0), &[(1, 100)]);
    repo.insert(&first).await.unwrap();
    let clash = Order::restore(
        Uuid::new_v4(),
        at(1),
        first.status,
        first.total_cents(),
        first.items().to_vec(),
    );

    // Act
    let result = repo.insert(&clash).await;

    // Assert
    assert!(result.is_err());
    assert!(repo.find_by_id(clash.id).await.unwrap().is_none());
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

// --- list ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_list_returns_orders_newest_first_with_items(pool: PgPool) {
    let repo = PgOrderRepository::new(pool);
    let older = make_order(at(0), &[(1, 100)]);
    let newer = make_order(at(5), &[(2, 300), (1, 50)]);
    repo.insert(&older).await.unwrap();
    repo.insert(&newer).await.unwrap();

    let orders = repo.list().await.unwrap();

    assert_eq!(orders, vec![newer, older]);
}

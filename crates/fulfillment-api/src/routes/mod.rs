//! Route modules and router assembly for each service.

pub mod health;
pub mod inventory;
pub mod sales;

use axum::Router;

use crate::state::{InventoryState, SalesState};

/// The full Sales service router.
pub fn sales_app(state: SalesState) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/vendas", sales::router())
        .with_state(state)
}

/// The full Inventory service router.
pub fn inventory_app(state: InventoryState) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/estoque", inventory::router())
        .with_state(state)
}

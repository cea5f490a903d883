//! `PostgreSQL` persistence for the fulfillment services.
//!
//! Each service owns its own tables; the message channel may live in a
//! separate database shared by both services.

pub mod pg_message_channel;
pub mod pg_order_repository;
pub mod pg_product_repository;
pub mod schema;

use fulfillment_core::error::DomainError;

fn infrastructure(e: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("database error: {e}"))
}

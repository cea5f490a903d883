//! Outbound adapters for the Sales context.

pub mod resilience;
pub mod stock_client;

//! Fulfillment: Sales bounded context.
//!
//! Accepts orders, verifies stock availability against the Inventory service
//! through a resilient client, persists accepted orders, and publishes the
//! sale confirmation that drives the asynchronous stock decrement.

pub mod application;
pub mod domain;
pub mod infrastructure;

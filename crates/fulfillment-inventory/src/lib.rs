//! Fulfillment: Inventory bounded context.
//!
//! Owns the authoritative stock records and applies sale confirmations
//! published by the Sales service.

pub mod application;
pub mod domain;

//! Fulfillment Core: shared abstractions for the Sales and Inventory services.
//!
//! This crate defines the traits and types both bounded contexts depend on:
//! time, randomness, errors, the caller identity, the event channel, and the
//! integration event contracts exchanged over it. It contains no
//! infrastructure code.

pub mod channel;
pub mod clock;
pub mod contracts;
pub mod error;
pub mod identity;
pub mod rng;

//! Shared test doubles and utilities for the fulfillment services.

mod channel;
mod clock;
mod rng;

pub use channel::{FailingChannel, InMemoryChannel, PublishedMessage};
pub use clock::FixedClock;
pub use rng::{MockRng, SequenceRng};

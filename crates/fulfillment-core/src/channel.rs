//! Event channel abstraction.
//!
//! The channel is an at-least-once, durable publish/subscribe transport
//! between the Sales and Inventory services. Publishers append messages to a
//! named channel; subscribers lease one message at a time and either
//! acknowledge it (removing it) or negatively acknowledge it (making it
//! visible again for redelivery). Consumers must tolerate duplicates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::DomainError;

/// A message leased from a channel.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Unique message identifier, stable across redeliveries.
    pub message_id: Uuid,
    /// Logical channel name.
    pub channel: String,
    /// Serialized message body.
    pub payload: serde_json::Value,
    /// When the message was first published.
    pub published_at: DateTime<Utc>,
    /// How many times this message has been handed to a subscriber,
    /// including this delivery.
    pub delivery_count: i32,
}

impl Delivery {
    /// Decodes the payload into a typed integration event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the payload does not match `E`.
    pub fn decode<E: IntegrationEvent>(&self) -> Result<E, DomainError> {
        serde_json::from_value(self.payload.clone()).map_err(|e| {
            DomainError::Validation(format!(
                "message {} on channel {} is not a valid {}: {e}",
                self.message_id,
                self.channel,
                E::CHANNEL
            ))
        })
    }
}

/// A message type exchanged between services over a fixed channel.
pub trait IntegrationEvent: Serialize + DeserializeOwned + Send + Sync {
    /// Logical channel the event travels on.
    const CHANNEL: &'static str;
}

/// Publishing side of the event channel.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Appends a message to `channel` and returns its identifier.
    async fn publish(
        &self,
        channel: &str,
        payload: serde_json::Value,
    ) -> Result<Uuid, DomainError>;
}

/// Subscribing side of the event channel.
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    /// Leases the oldest visible message on `channel`, if any.
    async fn receive(&self, channel: &str) -> Result<Option<Delivery>, DomainError>;

    /// Marks a leased message as processed.
    async fn ack(&self, message_id: Uuid) -> Result<(), DomainError>;

    /// Returns a leased message to the channel for redelivery.
    async fn nack(&self, message_id: Uuid, reason: &str) -> Result<(), DomainError>;
}

/// Serializes `event` and publishes it on its channel.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if serialization or the publish
/// itself fails.
pub async fn publish_event<E: IntegrationEvent>(
    publisher: &dyn EventPublisher,
    event: &E,
) -> Result<Uuid, DomainError> {
    let payload = serde_json::to_value(event)
        .map_err(|e| DomainError::Infrastructure(format!("event serialization failed: {e}")))?;
    publisher.publish(E::CHANNEL, payload).await
}

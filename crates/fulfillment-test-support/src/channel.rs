//! Test channels: in-memory `EventPublisher`/`EventSubscriber` doubles.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use fulfillment_core::channel::{Delivery, EventPublisher, EventSubscriber};
use fulfillment_core::error::DomainError;
use uuid::Uuid;

/// A message as it was handed to `publish`.
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    /// Identifier assigned at publish time.
    pub message_id: Uuid,
    /// Channel name.
    pub channel: String,
    /// Serialized payload.
    pub payload: serde_json::Value,
}

#[derive(Debug, Default)]
struct ChannelState {
    published: Vec<PublishedMessage>,
    pending: VecDeque<Delivery>,
    leased: HashMap<Uuid, Delivery>,
    acked: Vec<Uuid>,
    nacked: Vec<(Uuid, String)>,
}

/// An in-process channel that records every publish and hands messages to
/// subscribers in publish order. Negatively acknowledged messages go to the
/// back of the queue with their delivery count preserved.
///
/// Clones share the same underlying queue.
#[derive(Debug, Clone, Default)]
pub struct InMemoryChannel {
    state: Arc<Mutex<ChannelState>>,
}

impl InMemoryChannel {
    /// Creates an empty channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every message published so far, in publish order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.state.lock().unwrap().published.clone()
    }

    /// Returns the identifiers of acknowledged messages.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn acked(&self) -> Vec<Uuid> {
        self.state.lock().unwrap().acked.clone()
    }

    /// Returns the identifiers and reasons of negatively acknowledged messages.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn nacked(&self) -> Vec<(Uuid, String)> {
        self.state.lock().unwrap().nacked.clone()
    }

    /// Number of messages waiting to be received.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn pending_len(&self) -> usize {
        self.state.lock().unwrap().pending.len()
    }
}

#[async_trait]
impl EventPublisher for InMemoryChannel {
    async fn publish(
        &self,
        channel: &str,
        payload: serde_json::Value,
    ) -> Result<Uuid, DomainError> {
        let message_id = Uuid::new_v4();
        let mut state = self.state.lock().unwrap();
        state.published.push(PublishedMessage {
            message_id,
            channel: channel.to_owned(),
            payload: payload.clone(),
        });
        state.pending.push_back(Delivery {
            message_id,
            channel: channel.to_owned(),
            payload,
            published_at: Utc::now(),
            delivery_count: 0,
        });
        Ok(message_id)
    }
}

#[async_trait]
impl EventSubscriber for InMemoryChannel {
    async fn receive(&self, channel: &str) -> Result<Option<Delivery>, DomainError> {
        let mut state = self.state.lock().unwrap();
        let Some(position) = state.pending.iter().position(|d| d.channel == channel) else {
            return Ok(None);
        };
        let Some(mut delivery) = state.pending.remove(position) else {
            return Ok(None);
        };
        delivery.delivery_count += 1;
        state.leased.insert(delivery.message_id, delivery.clone());
        Ok(Some(delivery))
    }

    async fn ack(&self, message_id: Uuid) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        state
            .leased
            .remove(&message_id)
            .ok_or(DomainError::NotFound(message_id))?;
        state.acked.push(message_id);
        Ok(())
    }

    async fn nack(&self, message_id: Uuid, reason: &str) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        let delivery = state
            .leased
            .remove(&message_id)
            .ok_or(DomainError::NotFound(message_id))?;
        state.pending.push_back(delivery);
        state.nacked.push((message_id, reason.to_owned()));
        Ok(())
    }
}

/// A channel whose every operation fails with an infrastructure error.
#[derive(Debug)]
pub struct FailingChannel;

#[async_trait]
impl EventPublisher for FailingChannel {
    async fn publish(
        &self,
        _channel: &str,
        _payload: serde_json::Value,
    ) -> Result<Uuid, DomainError> {
        Err(DomainError::Infrastructure("broker unavailable".into()))
    }
}

#[async_trait]
impl EventSubscriber for FailingChannel {
    async fn receive(&self, _channel: &str) -> Result<Option<Delivery>, DomainError> {
        Err(DomainError::Infrastructure("broker unavailable".into()))
    }

    async fn ack(&self, _message_id: Uuid) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("broker unavailable".into()))
    }

    async fn nack(&self, _message_id: Uuid, _reason: &str) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("broker unavailable".into()))
    }
}

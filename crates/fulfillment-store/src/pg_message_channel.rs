//! Durable message channel on a `PostgreSQL` table.
//!
//! Receiving leases the oldest visible message by pushing its `visible_at`
//! forward; if the consumer neither acknowledges nor negatively acknowledges
//! it before the lease runs out, it becomes visible again and is redelivered.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use fulfillment_core::channel::{Delivery, EventPublisher, EventSubscriber};
use fulfillment_core::error::DomainError;

use crate::infrastructure;

/// Default time a received message stays invisible to other consumers.
pub const DEFAULT_LEASE: Duration = Duration::from_secs(30);

/// Default delay before a negatively acknowledged message is redelivered.
pub const DEFAULT_NACK_DELAY: Duration = Duration::from_secs(1);

/// PostgreSQL-backed at-least-once channel.
#[derive(Debug, Clone)]
pub struct PgMessageChannel {
    pool: PgPool,
    lease: Duration,
    nack_delay: Duration,
}

impl PgMessageChannel {
    /// Creates a channel with the default lease and redelivery delay.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lease: DEFAULT_LEASE,
            nack_delay: DEFAULT_NACK_DELAY,
        }
    }

    /// Sets how long a received message stays leased.
    #[must_use]
    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    /// Sets how long a negatively acknowledged message waits before it is
    /// visible again.
    #[must_use]
    pub fn with_nack_delay(mut self, nack_delay: Duration) -> Self {
        self.nack_delay = nack_delay;
        self
    }
}

#[derive(Debug, FromRow)]
struct MessageRow {
    message_id: Uuid,
    channel: String,
    payload: serde_json::Value,
    published_at: DateTime<Utc>,
    delivery_count: i32,
}

impl From<MessageRow> for Delivery {
    fn from(row: MessageRow) -> Self {
        Self {
            message_id: row.message_id,
            channel: row.channel,
            payload: row.payload,
            published_at: row.published_at,
            delivery_count: row.delivery_count,
        }
    }
}

#[async_trait]
impl EventPublisher for PgMessageChannel {
    async fn publish(
        &self,
        channel: &str,
        payload: serde_json::Value,
    ) -> Result<Uuid, DomainError> {
        let message_id = Uuid::now_v7();
        sqlx::query("INSERT INTO channel_messages (message_id, channel, payload) VALUES ($1, $2, $3)")
            .bind(message_id)
            .bind(channel)
            .bind(payload)
            .execute(&self.pool)
            .await
            .map_err(infrastructure)?;
        debug!(%message_id, channel, "message published");
        Ok(message_id)
    }
}

#[async_trait]
impl EventSubscriber for PgMessageChannel {
    async fn receive(&self, channel: &str) -> Result<Option<Delivery>, DomainError> {
        let row = sqlx::query_as::<_, MessageRow>(
            r"
            UPDATE channel_messages
            SET visible_at = clock_timestamp() + make_interval(secs => $2),
                delivery_count = delivery_count + 1
            WHERE message_id = (
                SELECT message_id
                FROM channel_messages
                WHERE channel = $1 AND visible_at <= clock_timestamp()
                ORDER BY seq
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING message_id, channel, payload, published_at, delivery_count
            ",
        )
        .bind(channel)
        .bind(self.lease.as_secs_f64())
        .fetch_optional(&self.pool)
        .await
        .map_err(infrastructure)?;
        Ok(row.map(Delivery::from))
    }

    async fn ack(&self, message_id: Uuid) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM channel_messages WHERE message_id = $1")
            .bind(message_id)
            .execute(&self.pool)
            .await
            .map_err(infrastructure)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(message_id));
        }
        Ok(())
    }

    async fn nack(&self, message_id: Uuid, reason: &str) -> Result<(), DomainError> {
        let result = sqlx::query(
            r"
            UPDATE channel_messages
            SET visible_at = clock_timestamp() + make_interval(secs => $2),
                last_error = $3
            WHERE message_id = $1
            ",
        )
        .bind(message_id)
        .bind(self.nack_delay.as_secs_f64())
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(infrastructure)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(message_id));
        }
        Ok(())
    }
}

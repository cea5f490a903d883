//! Background worker that applies sale confirmations to stock.
//!
//! Messages are acknowledged once processed, including when individual
//! items only produced warnings. A persistence failure negatively
//! acknowledges the message so the channel redelivers it. A payload that
//! cannot be decoded is acknowledged and logged.

use std::sync::Arc;
use std::time::Duration;

use fulfillment_core::channel::{EventSubscriber, IntegrationEvent};
use fulfillment_core::contracts::SaleConfirmed;
use fulfillment_core::error::DomainError;
use fulfillment_inventory::application::command_handlers::{
    StockDecrementReport, handle_sale_confirmed,
};
use fulfillment_inventory::domain::repository::ProductRepository;
use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

/// What happened to one received message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The confirmation was applied and acknowledged.
    Applied {
        /// The processed message.
        message_id: Uuid,
        /// Adjustments and warnings.
        report: StockDecrementReport,
    },
    /// Processing failed; the message was returned for redelivery.
    Requeued {
        /// The returned message.
        message_id: Uuid,
        /// Why processing failed.
        reason: String,
    },
    /// The payload was not a valid confirmation and was dropped.
    Discarded {
        /// The dropped message.
        message_id: Uuid,
        /// Why decoding failed.
        reason: String,
    },
}

/// Polls the sale confirmation channel and applies each message.
#[derive(Clone)]
pub struct StockDecrementWorker {
    subscriber: Arc<dyn EventSubscriber>,
    products: Arc<dyn ProductRepository>,
    poll_interval: Duration,
}

impl StockDecrementWorker {
    /// Creates a worker.
    #[must_use]
    pub fn new(
        subscriber: Arc<dyn EventSubscriber>,
        products: Arc<dyn ProductRepository>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            subscriber,
            products,
            poll_interval,
        }
    }

    /// Receives and handles at most one message. Returns `None` when the
    /// channel is empty.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if the channel itself fails (receive, ack, or
    /// nack).
    pub async fn process_next(&self) -> Result<Option<ProcessOutcome>, DomainError> {
        let Some(delivery) = self.subscriber.receive(SaleConfirmed::CHANNEL).await? else {
            return Ok(None);
        };
        let message_id = delivery.message_id;

        let event = match delivery.decode::<SaleConfirmed>() {
            Ok(event) => event,
            Err(e) => {
                error!(
                    %message_id,
                    delivery_count = delivery.delivery_count,
                    error = %e,
                    "discarding undecodable sale confirmation"
                );
                self.subscriber.ack(message_id).await?;
                return Ok(Some(ProcessOutcome::Discarded {
                    message_id,
                    reason: e.to_string(),
                }));
            }
        };

        if delivery.delivery_count > 1 {
            warn!(
                %message_id,
                order_id = %event.order_id,
                delivery_count = delivery.delivery_count,
                "sale confirmation redelivered; stock will be decremented again"
            );
        }

        match handle_sale_confirmed(&event, self.products.as_ref()).await {
            Ok(report) => {
                self.subscriber.ack(message_id).await?;
                Ok(Some(ProcessOutcome::Applied { message_id, report }))
            }
            Err(e) => {
                error!(
                    %message_id,
                    order_id = %event.order_id,
                    error = %e,
                    "stock decrement failed, returning message for redelivery"
                );
                let reason = e.to_string();
                self.subscriber.nack(message_id, &reason).await?;
                Ok(Some(ProcessOutcome::Requeued { message_id, reason }))
            }
        }
    }

    /// Processes messages until `shutdown` flips to `true`. Sleeps for the
    /// poll interval whenever the channel is empty or failing.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            channel = SaleConfirmed::CHANNEL,
            poll_interval_ms = self.poll_interval.as_millis(),
            "stock decrement worker started"
        );
        while !*shutdown.borrow() {
            let idle = match self.process_next().await {
                Ok(Some(_)) => false,
                Ok(None) => true,
                Err(e) => {
                    error!(error = %e, "message channel error");
                    true
                }
            };
            if idle {
                tokio::select! {
                    () = tokio::time::sleep(self.poll_interval) => {}
                    _ = shutdown.changed() => {}
                }
            }
        }
        info!("stock decrement worker stopped");
    }
}

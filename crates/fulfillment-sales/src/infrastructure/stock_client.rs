//! HTTP implementation of `StockQuery` against the Inventory service.

use async_trait::async_trait;
use fulfillment_core::identity::CallerIdentity;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use super::resilience::{ResiliencePolicy, Transient};
use crate::domain::stock::{StockLookup, StockQuery, StockSnapshot};

/// Failure of one HTTP attempt against Inventory.
#[derive(Debug, Error)]
pub enum StockTransportError {
    /// The request never produced a response (connect, TLS, timeout, reset).
    #[error("request to inventory failed: {0}")]
    Network(#[source] reqwest::Error),

    /// Inventory answered with a non-success status other than 404.
    #[error("inventory responded with status {0}")]
    Status(StatusCode),

    /// The response body was not a product snapshot.
    #[error("inventory response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),
}

impl Transient for StockTransportError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status(status) => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::Decode(_) => false,
        }
    }
}

/// Queries `GET {base_url}/estoque/produtos/{id}` through a resilience
/// policy, forwarding the caller's bearer token.
#[derive(Debug, Clone)]
pub struct HttpStockQueryClient {
    http: reqwest::Client,
    base_url: String,
    policy: ResiliencePolicy,
}

impl HttpStockQueryClient {
    /// Creates a client for the Inventory service at `base_url`.
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, policy: ResiliencePolicy) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            http,
            base_url,
            policy,
        }
    }

    /// The resilience policy guarding this client.
    #[must_use]
    pub fn policy(&self) -> &ResiliencePolicy {
        &self.policy
    }

    fn product_url(&self, product_id: Uuid) -> String {
        format!("{}/estoque/produtos/{product_id}", self.base_url)
    }

    async fn request_product(
        &self,
        product_id: Uuid,
        caller: &CallerIdentity,
        attempt: u32,
    ) -> Result<Option<StockSnapshot>, StockTransportError> {
        debug!(%product_id, attempt, "querying inventory");
        let response = self
            .http
            .get(self.product_url(product_id))
            .bearer_auth(caller.token())
            .send()
            .await
            .map_err(StockTransportError::Network)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StockTransportError::Status(status));
        }

        let snapshot = response.json::<StockSnapshot>().await.map_err(|e| {
            if e.is_decode() {
                StockTransportError::Decode(e)
            } else {
                StockTransportError::Network(e)
            }
        })?;
        Ok(Some(snapshot))
    }
}

#[async_trait]
impl StockQuery for HttpStockQueryClient {
    async fn fetch(&self, product_id: Uuid, caller: &CallerIdentity) -> StockLookup {
        let outcome = self
            .policy
            .execute(|attempt| self.request_product(product_id, caller, attempt))
            .await;

        match outcome {
            Ok(Some(snapshot)) => StockLookup::Found(snapshot),
            Ok(None) => StockLookup::NotFound,
            Err(error) => {
                warn!(%product_id, error = %error, "stock query unavailable");
                StockLookup::Unavailable(error.to_string())
            }
        }
    }
}

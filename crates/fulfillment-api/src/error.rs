//! Fulfillment: API error types.

use std::time::Duration;

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use fulfillment_core::error::DomainError;
use fulfillment_sales::application::command_handlers::OrderRejection;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Startup and runtime errors for the service binaries.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration or other domain-level startup failure.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Telemetry pipeline could not be set up.
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
    /// Product the error is about, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<Uuid>,
    /// Units on hand, for `insufficient_stock`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<i32>,
    /// Units requested, for `insufficient_stock`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested: Option<i32>,
}

impl ErrorBody {
    fn new(error: &'static str, message: String) -> Self {
        Self {
            error,
            message,
            product_id: None,
            available: None,
            requested: None,
        }
    }
}

/// HTTP-layer error that implements `IntoResponse`.
#[derive(Debug)]
pub enum ApiError {
    /// A domain or infrastructure failure.
    Domain(DomainError),
    /// An order was rejected by the workflow.
    Order {
        /// Why the order was rejected.
        rejection: OrderRejection,
        /// Wait advertised in `Retry-After` when stock is unavailable.
        retry_after: Duration,
    },
    /// The request carried no usable bearer credential.
    Unauthorized,
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl ApiError {
    /// Wraps an order rejection. `retry_after` is sent as `Retry-After` on
    /// a `stock_unavailable` answer and should match the circuit break
    /// duration.
    #[must_use]
    pub fn order(rejection: OrderRejection, retry_after: Duration) -> Self {
        match rejection {
            OrderRejection::Domain(inner) => Self::Domain(inner),
            rejection => Self::Order {
                rejection,
                retry_after,
            },
        }
    }
}

/// Whole seconds for a `Retry-After` header, rounded up and at least one.
fn retry_after_secs(wait: Duration) -> u64 {
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    secs.max(1)
}

fn domain_response(err: &DomainError) -> (StatusCode, ErrorBody) {
    let (status, code) = match err {
        DomainError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        DomainError::Infrastructure(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
        }
    };
    (status, ErrorBody::new(code, err.to_string()))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut retry_after = None;
        let (status, body) = match &self {
            Self::Domain(err) => domain_response(err),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new(
                    "unauthorized",
                    "a bearer token is required in the Authorization header".to_owned(),
                ),
            ),
            Self::Order {
                rejection,
                retry_after: wait,
            } => {
                let message = rejection.to_string();
                match rejection {
                    OrderRejection::Validation(_) => (
                        StatusCode::BAD_REQUEST,
                        ErrorBody::new("validation_error", message),
                    ),
                    OrderRejection::ProductNotFound { product_id } => (
                        StatusCode::BAD_REQUEST,
                        ErrorBody {
                            product_id: Some(*product_id),
                            ..ErrorBody::new("product_not_found", message)
                        },
                    ),
                    OrderRejection::InsufficientStock {
                        product_id,
                        available,
                        requested,
                        ..
                    } => (
                        StatusCode::CONFLICT,
                        ErrorBody {
                            product_id: Some(*product_id),
                            available: Some(*available),
                            requested: Some(*requested),
                            ..ErrorBody::new("insufficient_stock", message)
                        },
                    ),
                    OrderRejection::StockUnavailable { product_id, .. } => {
                        retry_after = Some(retry_after_secs(*wait));
                        (
                            StatusCode::SERVICE_UNAVAILABLE,
                            ErrorBody {
                                product_id: Some(*product_id),
                                ..ErrorBody::new("stock_unavailable", message)
                            },
                        )
                    }
                    OrderRejection::Domain(err) => domain_response(err),
                }
            }
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

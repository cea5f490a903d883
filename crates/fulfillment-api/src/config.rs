//! Service configuration read from the environment at startup.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use fulfillment_sales::infrastructure::resilience::{CircuitBreakerConfig, RetryConfig};

use crate::error::AppError;

const OTLP_ENDPOINT_VAR: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

/// Configuration for the Sales service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Connection string for the orders database.
    pub database_url: String,
    /// Connection string for the message channel database.
    pub channel_database_url: String,
    /// Base URL of the Inventory service.
    pub inventory_base_url: String,
    /// Overall deadline for one stock query across all attempts.
    pub stock_query_timeout: Duration,
    /// Retry policy for stock queries.
    pub retry: RetryConfig,
    /// Circuit breaker for stock queries.
    pub breaker: CircuitBreakerConfig,
    /// OTLP collector endpoint; spans are only exported when set.
    pub otlp_endpoint: Option<String>,
}

/// Configuration for the Inventory service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Connection string for the products database.
    pub database_url: String,
    /// Connection string for the message channel database.
    pub channel_database_url: String,
    /// Idle wait between polls of an empty channel.
    pub poll_interval: Duration,
    /// How long a received message stays leased to this consumer.
    pub channel_lease: Duration,
    /// OTLP collector endpoint; spans are only exported when set.
    pub otlp_endpoint: Option<String>,
}

impl SalesConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`SalesConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url = required(&lookup, "DATABASE_URL")?;
        let defaults = RetryConfig::default();
        let max_attempts: u32 = parse_or(&lookup, "STOCK_RETRY_MAX_ATTEMPTS", defaults.max_attempts)?;
        if max_attempts == 0 {
            return Err(AppError::Config(
                "STOCK_RETRY_MAX_ATTEMPTS must be at least 1".to_owned(),
            ));
        }
        let failure_threshold: u32 = parse_or(&lookup, "STOCK_BREAKER_THRESHOLD", 5)?;
        if failure_threshold == 0 {
            return Err(AppError::Config(
                "STOCK_BREAKER_THRESHOLD must be at least 1".to_owned(),
            ));
        }

        Ok(Self {
            bind_addr: bind_addr(&lookup, 3000)?,
            channel_database_url: lookup("CHANNEL_DATABASE_URL")
                .unwrap_or_else(|| database_url.clone()),
            database_url,
            inventory_base_url: lookup("INVENTORY_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3001".to_owned()),
            stock_query_timeout: Duration::from_secs(parse_or(
                &lookup,
                "STOCK_QUERY_TIMEOUT_SECS",
                15,
            )?),
            retry: RetryConfig {
                max_attempts,
                ..defaults
            },
            breaker: CircuitBreakerConfig {
                failure_threshold,
                break_duration: Duration::from_secs(parse_or(
                    &lookup,
                    "STOCK_BREAKER_BREAK_SECS",
                    10,
                )?),
            },
            otlp_endpoint: lookup(OTLP_ENDPOINT_VAR),
        })
    }
}

impl InventoryConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`InventoryConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url = required(&lookup, "DATABASE_URL")?;
        Ok(Self {
            bind_addr: bind_addr(&lookup, 3001)?,
            channel_database_url: lookup("CHANNEL_DATABASE_URL")
                .unwrap_or_else(|| database_url.clone()),
            database_url,
            poll_interval: Duration::from_millis(parse_or(
                &lookup,
                "CONSUMER_POLL_INTERVAL_MS",
                500,
            )?),
            channel_lease: Duration::from_secs(parse_or(&lookup, "CHANNEL_LEASE_SECS", 30)?),
            otlp_endpoint: lookup(OTLP_ENDPOINT_VAR),
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, AppError> {
    lookup(key).ok_or_else(|| AppError::Config(format!("{key} environment variable must be set")))
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid ({raw:?}): {e}"))),
        None => Ok(default),
    }
}

fn bind_addr(
    lookup: &impl Fn(&str) -> Option<String>,
    default_port: u16,
) -> Result<SocketAddr, AppError> {
    let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_owned());
    let port: u16 = parse_or(lookup, "PORT", default_port)?;
    format!("{host}:{port}")
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
}

//! Price data provider
//!
//! Supplies application metrics (mint price, floor price, secondary token
//! price). The monitors only rely on the `PriceDataProvider` contract:
//! a value or `Unavailable`. How the value is obtained is up to the
//! implementation; `HttpPriceDataProvider` reads a JSON snapshot feed.

use async_trait::async_trait;
use chrono::Utc;
use futures_util::future::join3;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;

use crate::config::PriceDataConfig;
use crate::models::{MarketSnapshot, PriceMetric};

/// Provider errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The metric could not be obtained or parsed
    #[error("{metric} unavailable: {reason}")]
    Unavailable { metric: PriceMetric, reason: String },
}

impl ProviderError {
    pub fn unavailable(metric: PriceMetric, reason: impl Into<String>) -> Self {
        ProviderError::Unavailable {
            metric,
            reason: reason.into(),
        }
    }
}

/// One reading per metric
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricReadings {
    pub mint_price: Result<Decimal, ProviderError>,
    pub floor_price: Result<Decimal, ProviderError>,
    pub secondary_price: Result<Decimal, ProviderError>,
}

/// Source of application metrics
#[async_trait]
pub trait PriceDataProvider: Send + Sync {
    async fn fetch(&self, metric: PriceMetric) -> Result<Decimal, ProviderError>;

    /// Read every metric; by default three concurrent `fetch` calls
    async fn fetch_all(&self) -> MetricReadings {
        let (mint_price, floor_price, secondary_price) = join3(
            self.fetch(PriceMetric::MintPrice),
            self.fetch(PriceMetric::FloorPrice),
            self.fetch(PriceMetric::SecondaryPrice),
        )
        .await;

        MetricReadings {
            mint_price,
            floor_price,
            secondary_price,
        }
    }
}

/// Strip display decoration ("USDC", "$", thousands separators) from a metric
pub fn clean_metric_text(text: &str) -> String {
    text.replace("USDC", "")
        .replace('$', "")
        .replace(',', "")
        .trim()
        .to_string()
}

/// Parse a displayed metric into a non-negative decimal
pub fn parse_metric_text(metric: PriceMetric, text: &str) -> Result<Decimal, ProviderError> {
    let cleaned = clean_metric_text(text);
    if cleaned.is_empty() {
        return Err(ProviderError::unavailable(metric, "empty after cleaning"));
    }

    let value = Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|_| {
            ProviderError::unavailable(metric, format!("invalid number format '{}'", cleaned))
        })?;

    if value.is_sign_negative() {
        return Err(ProviderError::unavailable(metric, format!("negative value {}", value)));
    }

    Ok(value)
}

/// Read every metric; unavailable metrics are left empty
pub async fn collect_snapshot(provider: &dyn PriceDataProvider) -> MarketSnapshot {
    let readings = provider.fetch_all().await;

    for result in [
        &readings.mint_price,
        &readings.floor_price,
        &readings.secondary_price,
    ] {
        if let Err(e) = result {
            tracing::warn!(error = %e, "Market metric unavailable");
        }
    }

    MarketSnapshot {
        mint_price: readings.mint_price.ok(),
        floor_price: readings.floor_price.ok(),
        secondary_price: readings.secondary_price.ok(),
        fetched_at: Utc::now(),
    }
}

/// Provider backed by a JSON snapshot endpoint
///
/// Expected body: `{"mint_price": "$1.23", "floor_price": 1.05, "secondary_price": "0.42 USDC"}`
pub struct HttpPriceDataProvider {
    client: reqwest::Client,
    snapshot_url: String,
}

impl HttpPriceDataProvider {
    pub fn new(
        snapshot_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            snapshot_url: snapshot_url.into(),
        })
    }

    /// Build from config; `None` when no snapshot URL is configured
    pub fn from_config(config: &PriceDataConfig) -> Result<Option<Self>, reqwest::Error> {
        match &config.snapshot_url {
            Some(url) if !url.is_empty() => {
                Self::new(url.clone(), Duration::from_secs(config.timeout_secs)).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// GET the snapshot document once
    async fn fetch_document(&self) -> Result<Value, String> {
        tracing::debug!(url = %self.snapshot_url, "Fetching market snapshot");

        let response = self
            .client
            .get(&self.snapshot_url)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("snapshot endpoint returned {}", response.status()));
        }

        response
            .json()
            .await
            .map_err(|e| format!("malformed snapshot: {}", e))
    }
}

/// Pick one metric out of a snapshot document
fn read_metric(body: &Value, metric: PriceMetric) -> Result<Decimal, ProviderError> {
    match body.get(metric.key()) {
        Some(Value::String(text)) => parse_metric_text(metric, text),
        Some(Value::Number(number)) => parse_metric_text(metric, &number.to_string()),
        Some(Value::Null) | None => Err(ProviderError::unavailable(
            metric,
            "not present in snapshot",
        )),
        Some(other) => Err(ProviderError::unavailable(
            metric,
            format!("unexpected value {}", other),
        )),
    }
}

#[async_trait]
impl PriceDataProvider for HttpPriceDataProvider {
    async fn fetch(&self, metric: PriceMetric) -> Result<Decimal, ProviderError> {
        let body = self
            .fetch_document()
            .await
            .map_err(|reason| ProviderError::unavailable(metric, reason))?;
        read_metric(&body, metric)
    }

    async fn fetch_all(&self) -> MetricReadings {
        let body = self.fetch_document().await;
        let read = |metric| match &body {
            Ok(body) => read_metric(body, metric),
            Err(reason) => Err(ProviderError::unavailable(metric, reason.clone())),
        };

        MetricReadings {
            mint_price: read(PriceMetric::MintPrice),
            floor_price: read(PriceMetric::FloorPrice),
            secondary_price: read(PriceMetric::SecondaryPrice),
        }
    }
}

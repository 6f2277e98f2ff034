//! Fiat rate oracle for the chain's native asset
//!
//! Used to attach a USD value to detected buys. Any failure (network,
//! non-200, malformed body, timeout) yields the configured fallback rate so
//! the buy pipeline never stalls on this value. Successful quotes are reused
//! for a short TTL so a burst of buys costs one request.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::OracleConfig;
use crate::metrics::MetricsState;

/// Source of a fiat rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    /// CoinGecko simple-price API
    CoinGecko,
    /// Configured fallback constant
    Fallback,
}

impl std::fmt::Display for PriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CoinGecko => write!(f, "CoinGecko"),
            Self::Fallback => write!(f, "Fallback"),
        }
    }
}

/// Rate quote
#[derive(Debug, Clone)]
pub struct PriceEntry {
    /// USD per native unit
    pub rate: Decimal,
    /// When this rate was fetched
    pub fetched_at: DateTime<Utc>,
    /// Where the rate came from
    pub source: PriceSource,
}

/// Fiat rate lookup used by the ledger poller
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// USD per native unit; `None` only when no rate can be produced at all
    async fn native_usd_rate(&self) -> Option<Decimal>;
}

/// Oracle errors
#[derive(Debug, thiserror::Error)]
pub enum PriceOracleError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// JSON parsing failed or the rate is missing
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Rate limited
    #[error("Rate limited by price API")]
    RateLimited,
}

/// CoinGecko simple-price client with fallback
pub struct CoinGeckoOracle {
    client: reqwest::Client,
    url: String,
    asset_id: String,
    fallback_rate: Decimal,
    ttl: Duration,
    cached: RwLock<Option<PriceEntry>>,
    metrics: Arc<MetricsState>,
}

impl CoinGeckoOracle {
    pub fn new(
        config: &OracleConfig,
        metrics: Arc<MetricsState>,
    ) -> Result<Self, PriceOracleError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                PriceOracleError::HttpError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            url: config.url.clone(),
            asset_id: config.asset_id.clone(),
            fallback_rate: config.fallback_rate,
            ttl: Duration::seconds(config.cache_ttl_secs as i64),
            cached: RwLock::new(None),
            metrics,
        })
    }

    /// Current quote: cached, freshly fetched, or the fallback
    pub async fn current_quote(&self) -> PriceEntry {
        if let Some(entry) = self.fresh_cached() {
            return entry;
        }

        match self.fetch_rate().await {
            Ok(rate) => {
                let entry = PriceEntry {
                    rate,
                    fetched_at: Utc::now(),
                    source: PriceSource::CoinGecko,
                };
                *self.cached.write() = Some(entry.clone());
                entry
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    fallback_rate = %self.fallback_rate,
                    "Price oracle unavailable, using fallback rate"
                );
                self.metrics.oracle_fallbacks.inc();
                PriceEntry {
                    rate: self.fallback_rate,
                    fetched_at: Utc::now(),
                    source: PriceSource::Fallback,
                }
            }
        }
    }

    fn fresh_cached(&self) -> Option<PriceEntry> {
        let cached = self.cached.read();
        let entry = cached.as_ref()?;

        let age = Utc::now().signed_duration_since(entry.fetched_at);
        if age > self.ttl {
            return None;
        }

        Some(entry.clone())
    }

    /// Fetch the rate from the quote service
    async fn fetch_rate(&self) -> Result<Decimal, PriceOracleError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("ids", self.asset_id.as_str()), ("vs_currencies", "usd")])
            .send()
            .await
            .map_err(|e| PriceOracleError::HttpError(format!("Oracle request failed: {}", e)))?;

        if response.status() == 429 {
            return Err(PriceOracleError::RateLimited);
        }

        if !response.status().is_success() {
            return Err(PriceOracleError::HttpError(format!(
                "Oracle returned error: {}",
                response.status()
            )));
        }

        let data: HashMap<String, QuoteData> = response
            .json()
            .await
            .map_err(|e| {
                PriceOracleError::ParseError(format!("Failed to parse oracle response: {}", e))
            })?;

        let rate = data
            .get(&self.asset_id)
            .and_then(|quote| quote.usd)
            .ok_or_else(|| {
                PriceOracleError::ParseError(format!("No usd rate for {}", self.asset_id))
            })?;

        if rate.is_sign_negative() {
            return Err(PriceOracleError::ParseError(format!("Negative rate {}", rate)));
        }

        tracing::debug!(asset = %self.asset_id, %rate, "Fetched oracle rate");
        Ok(rate)
    }
}

#[async_trait]
impl PriceOracle for CoinGeckoOracle {
    async fn native_usd_rate(&self) -> Option<Decimal> {
        Some(self.current_quote().await.rate)
    }
}

/// Quote entry for one asset: `{"solana": {"usd": 142.31}}`
#[derive(Debug, serde::Deserialize)]
struct QuoteData {
    usd: Option<Decimal>,
}

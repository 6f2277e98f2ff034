//! Market models - metrics supplied by the price data provider

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Metrics a price data provider can supply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceMetric {
    /// Primary mint price of the tracked token
    MintPrice,
    /// Floor price of the tracked token
    FloorPrice,
    /// Price of the secondary token
    SecondaryPrice,
}

impl PriceMetric {
    pub const ALL: [PriceMetric; 3] = [
        PriceMetric::MintPrice,
        PriceMetric::FloorPrice,
        PriceMetric::SecondaryPrice,
    ];

    /// Key used in snapshot payloads
    pub fn key(&self) -> &'static str {
        match self {
            PriceMetric::MintPrice => "mint_price",
            PriceMetric::FloorPrice => "floor_price",
            PriceMetric::SecondaryPrice => "secondary_price",
        }
    }
}

impl std::fmt::Display for PriceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// One reading of the floor metric
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorSample {
    /// Reading, `None` when the provider was unavailable or returned garbage
    pub value: Option<Decimal>,
    /// When the reading was taken
    pub observed_at: DateTime<Utc>,
}

impl FloorSample {
    pub fn present(value: Decimal) -> Self {
        Self {
            value: Some(value),
            observed_at: Utc::now(),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            value: None,
            observed_at: Utc::now(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.value.is_some()
    }
}

/// All provider metrics read at (roughly) the same moment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketSnapshot {
    pub mint_price: Option<Decimal>,
    pub floor_price: Option<Decimal>,
    pub secondary_price: Option<Decimal>,
    pub fetched_at: DateTime<Utc>,
}

impl MarketSnapshot {
    /// Value for a metric, if it was available
    pub fn get(&self, metric: PriceMetric) -> Option<Decimal> {
        match metric {
            PriceMetric::MintPrice => self.mint_price,
            PriceMetric::FloorPrice => self.floor_price,
            PriceMetric::SecondaryPrice => self.secondary_price,
        }
    }

    /// Number of metrics that could be read
    pub fn available_count(&self) -> usize {
        PriceMetric::ALL
            .iter()
            .filter(|m| self.get(**m).is_some())
            .count()
    }
}

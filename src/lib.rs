//! Buy-watch Operator Library
//!
//! Buy detection and floor-price monitoring for a Solana token.
//! This library exposes core modules for testing.

pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod monitoring;
pub mod notifications;
pub mod price_data;
pub mod price_oracle;
pub mod utils;

// Re-export commonly used types for tests
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use metrics::MetricsState;
pub use models::{BuyCandidate, BuyEvent, FloorSample, MarketSnapshot, PriceMetric};
pub use monitoring::{
    FloorTracker, LedgerCursor, LedgerPoller, LedgerPollerConfig, MonitorState, PollOutcome,
    TransactionClassifier,
};
pub use notifications::{Alert, AlertDispatcher, DeliveryError, DiscordNotifier, Notifier};
pub use price_data::{HttpPriceDataProvider, PriceDataProvider, ProviderError};
pub use price_oracle::{CoinGeckoOracle, PriceOracle};

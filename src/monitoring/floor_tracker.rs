//! Floor price tracker
//!
//! Alerts only on strict increases. Equal or lower readings replace the
//! stored value silently; unavailable readings leave it untouched.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

use crate::metrics::MetricsState;
use crate::models::{FloorSample, PriceMetric};
use crate::monitoring::state::FloorState;
use crate::notifications::{Alert, AlertDispatcher};
use crate::price_data::PriceDataProvider;

/// Outcome of one floor check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FloorCheck {
    /// Provider gave nothing usable; state unchanged
    Unavailable,
    /// First valid reading stored
    Seeded(Decimal),
    /// Strict increase over the stored value
    Increased { previous: Decimal, current: Decimal },
    /// Equal or lower reading stored without alerting
    Unchanged { previous: Decimal, current: Decimal },
}

impl FloorCheck {
    pub fn outcome(&self) -> &'static str {
        match self {
            FloorCheck::Unavailable => "unavailable",
            FloorCheck::Seeded(_) => "seeded",
            FloorCheck::Increased { .. } => "increased",
            FloorCheck::Unchanged { .. } => "unchanged",
        }
    }
}

/// Polls the floor metric and detects increases
pub struct FloorTracker {
    provider: Arc<dyn PriceDataProvider>,
    dispatcher: Arc<AlertDispatcher>,
    provider_timeout: Duration,
    metrics: Arc<MetricsState>,
}

impl FloorTracker {
    pub fn new(
        provider: Arc<dyn PriceDataProvider>,
        dispatcher: Arc<AlertDispatcher>,
        provider_timeout: Duration,
        metrics: Arc<MetricsState>,
    ) -> Self {
        Self {
            provider,
            dispatcher,
            provider_timeout,
            metrics,
        }
    }

    /// Read the floor metric, bounded by the provider timeout
    pub async fn sample(&self) -> FloorSample {
        let fetch = self.provider.fetch(PriceMetric::FloorPrice);
        match tokio::time::timeout(self.provider_timeout, fetch).await {
            Ok(Ok(value)) => FloorSample::present(value),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Floor price unavailable, skipping cycle");
                FloorSample::unavailable()
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.provider_timeout.as_secs(),
                    "Floor price fetch timed out, skipping cycle"
                );
                FloorSample::unavailable()
            }
        }
    }

    /// Compare a sample against the stored value and update it
    pub fn evaluate(sample: &FloorSample, state: &mut FloorState) -> FloorCheck {
        let Some(current) = sample.value else {
            return FloorCheck::Unavailable;
        };

        match state.record(current) {
            None => FloorCheck::Seeded(current),
            Some(previous) if current > previous => FloorCheck::Increased { previous, current },
            Some(previous) => FloorCheck::Unchanged { previous, current },
        }
    }

    /// One tick: sample, evaluate, alert on increase
    pub async fn run_cycle(&self, state: &mut FloorState) -> FloorCheck {
        tracing::debug!("Checking floor price");

        let sample = self.sample().await;
        let check = Self::evaluate(&sample, state);

        if let Some(value) = state.last_floor_price().and_then(|v| v.to_f64()) {
            self.metrics.floor_price.set(value);
        }

        match &check {
            FloorCheck::Unavailable => {}
            FloorCheck::Seeded(value) => {
                tracing::info!(floor_price = %value, "Floor price seeded");
            }
            FloorCheck::Unchanged { previous, current } => {
                tracing::debug!(%previous, %current, "Floor price not increased");
            }
            FloorCheck::Increased { previous, current } => {
                tracing::info!(%previous, %current, "Floor price increased");
                let alert = Alert::FloorIncrease {
                    previous: *previous,
                    current: *current,
                };
                // Delivery failures are logged by the dispatcher and do not roll back state
                let _ = self.dispatcher.dispatch(&alert).await;
            }
        }

        check
    }
}

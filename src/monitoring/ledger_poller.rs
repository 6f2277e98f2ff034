//! Ledger poller
//!
//! Lists recent signatures for the watched address and classifies every
//! signature newer than the cursor. Catch-up after a gap is capped at the
//! newest `catch_up_limit` entries; older buys inside a large gap are dropped
//! rather than replayed.
//! The cursor always moves to the head of the listing at the end of a cycle.

use std::sync::Arc;

use crate::metrics::MetricsState;
use crate::models::BuyEvent;
use crate::monitoring::classifier::TransactionClassifier;
use crate::monitoring::rpc_client::LedgerRpc;
use crate::monitoring::state::LedgerCursor;
use crate::notifications::{Alert, AlertDispatcher};
use crate::price_oracle::PriceOracle;

/// Configuration for the ledger poller
#[derive(Debug, Clone)]
pub struct LedgerPollerConfig {
    /// Watched token contract address
    pub token_address: String,
    /// Signatures requested per listing
    pub signature_limit: usize,
    /// Newest entries inspected after a gap
    pub catch_up_limit: usize,
}

/// Outcome of one poll cycle
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Listing request failed; cursor unchanged
    ListingFailed,
    /// Listing was empty; cursor unchanged
    EmptyListing,
    /// First observation: cursor set, nothing classified
    CursorInitialized,
    /// Head of the listing equals the cursor
    NoNewActivity,
    /// New signatures were inspected
    Processed { inspected: usize, buys: Vec<BuyEvent> },
}

impl PollOutcome {
    pub fn outcome(&self) -> &'static str {
        match self {
            PollOutcome::ListingFailed => "listing_failed",
            PollOutcome::EmptyListing => "empty",
            PollOutcome::CursorInitialized => "initialized",
            PollOutcome::NoNewActivity => "idle",
            PollOutcome::Processed { .. } => "processed",
        }
    }

    pub fn buys(&self) -> &[BuyEvent] {
        match self {
            PollOutcome::Processed { buys, .. } => buys,
            _ => &[],
        }
    }
}

/// Polls the ledger for buys of the watched token
pub struct LedgerPoller {
    rpc: Arc<dyn LedgerRpc>,
    oracle: Arc<dyn PriceOracle>,
    classifier: TransactionClassifier,
    dispatcher: Arc<AlertDispatcher>,
    config: LedgerPollerConfig,
    metrics: Arc<MetricsState>,
}

impl LedgerPoller {
    pub fn new(
        rpc: Arc<dyn LedgerRpc>,
        oracle: Arc<dyn PriceOracle>,
        classifier: TransactionClassifier,
        dispatcher: Arc<AlertDispatcher>,
        config: LedgerPollerConfig,
        metrics: Arc<MetricsState>,
    ) -> Self {
        Self {
            rpc,
            oracle,
            classifier,
            dispatcher,
            config,
            metrics,
        }
    }

    /// Detect new buys and advance the cursor; does not send alerts
    pub async fn poll_once(&self, cursor: &mut LedgerCursor) -> PollOutcome {
        let listing = match self
            .rpc
            .get_signatures_for_address(&self.config.token_address, self.config.signature_limit)
            .await
        {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch signatures, skipping poll cycle");
                return PollOutcome::ListingFailed;
            }
        };

        let Some(latest) = listing.first().map(|info| info.signature.clone()) else {
            tracing::debug!(token = %self.config.token_address, "No signatures returned");
            return PollOutcome::EmptyListing;
        };

        let previous = match cursor.last_signature() {
            None => {
                cursor.advance(&latest);
                tracing::info!(signature = %latest, "Ledger cursor initialized");
                return PollOutcome::CursorInitialized;
            }
            Some(previous) if previous == latest => {
                tracing::trace!("No new transactions detected");
                return PollOutcome::NoNewActivity;
            }
            Some(previous) => previous.to_string(),
        };

        let mut inspected = 0;
        let mut buys = Vec::new();

        for info in listing.iter().take(self.config.catch_up_limit) {
            if info.signature == previous {
                break;
            }
            inspected += 1;

            if info.err.is_some() {
                tracing::debug!(signature = %info.signature, "Skipping failed transaction");
                continue;
            }

            let record = match self.rpc.get_transaction(&info.signature).await {
                Ok(Some(record)) => record,
                Ok(None) => {
                    tracing::debug!(signature = %info.signature, "Transaction not found");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(
                        signature = %info.signature,
                        error = %e,
                        "Failed to fetch transaction"
                    );
                    continue;
                }
            };

            let candidate = match self.classifier.evaluate(&record) {
                Ok(candidate) => candidate,
                Err(reason) => {
                    tracing::debug!(signature = %info.signature, %reason, "Not a buy");
                    continue;
                }
            };

            let rate = self.oracle.native_usd_rate().await;
            let event = BuyEvent::from_candidate(candidate, info.signature.clone(), rate);

            tracing::info!(
                signature = %event.signature,
                buyer = %event.buyer,
                sol_amount = %event.sol_amount,
                usd_amount = %event.usd_amount,
                "Buy detected"
            );
            self.metrics.buy_events.inc();
            buys.push(event);
        }

        cursor.advance(&latest);

        PollOutcome::Processed { inspected, buys }
    }

    /// One tick: detect buys, then attempt one alert per buy
    pub async fn run_cycle(&self, cursor: &mut LedgerCursor) -> PollOutcome {
        tracing::debug!(token = %self.config.token_address, "Polling for new transactions");

        let outcome = self.poll_once(cursor).await;

        for event in outcome.buys() {
            // Delivery failures are logged by the dispatcher and never roll back the cursor
            let _ = self.dispatcher.dispatch(&Alert::Buy(event.clone())).await;
        }

        outcome
    }
}

//! Alert composition and dispatch
//!
//! Alerts:
//! - Buy detected (feed channel)
//! - Floor price increase (feed channel)
//! - Market update (discussion channel)
//!
//! An alert counts as sent once delivery has been attempted. Failures are
//! logged and counted; there is no re-delivery queue.

pub mod discord;

pub use discord::DiscordNotifier;

use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;

use crate::metrics::MetricsState;
use crate::models::{BuyEvent, MarketSnapshot};
use crate::utils::truncate_address;

/// Alert delivery errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeliveryError {
    /// Connection failure or timeout
    #[error("transport error: {0}")]
    Transport(String),

    /// Chat platform asked us to slow down
    #[error("rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<f64> },

    /// Chat platform refused the message
    #[error("rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Delivers text to a chat channel
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, channel_id: u64, text: &str) -> Result<(), DeliveryError>;
}

/// Alert types
#[derive(Debug, Clone)]
pub enum Alert {
    /// A buy was classified
    Buy(BuyEvent),
    /// The floor price strictly increased
    FloorIncrease { previous: Decimal, current: Decimal },
    /// Snapshot of all market metrics
    MarketUpdate(MarketSnapshot),
}

impl Alert {
    /// Label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Alert::Buy(_) => "buy",
            Alert::FloorIncrease { .. } => "floor",
            Alert::MarketUpdate(_) => "market",
        }
    }

    /// Format the alert as a chat message
    pub fn format_message(&self) -> String {
        match self {
            Alert::Buy(event) => format!(
                "🚨 Buy Detected\nWallet `{}` just bought for **{} SOL** (~${}).",
                truncate_address(&event.buyer),
                round_for_display(event.sol_amount, 2),
                round_for_display(event.usd_amount, 0),
            ),
            Alert::FloorIncrease { current, .. } => format!(
                "📈 **Floor Price Update**\nThe floor just moved to **${}**.",
                current
            ),
            Alert::MarketUpdate(snapshot) => format!(
                "📊 **Market Update**\n- **Mint Price:** {}\n- **Secondary Price:** {}\n- **Floor Price:** {}",
                display_metric(snapshot.mint_price),
                display_metric(snapshot.secondary_price),
                display_metric(snapshot.floor_price),
            ),
        }
    }
}

/// Round half away from zero and pad to exactly `dp` decimal places
fn round_for_display(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", dp as usize, rounded)
}

fn display_metric(value: Option<Decimal>) -> String {
    match value {
        Some(v) => format!("${}", v),
        None => "N/A".to_string(),
    }
}

/// Sends alerts to their destination channel
pub struct AlertDispatcher {
    notifier: Arc<dyn Notifier>,
    feed_channel_id: u64,
    discussion_channel_id: u64,
    metrics: Arc<MetricsState>,
}

impl AlertDispatcher {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        feed_channel_id: u64,
        discussion_channel_id: u64,
        metrics: Arc<MetricsState>,
    ) -> Self {
        Self {
            notifier,
            feed_channel_id,
            discussion_channel_id,
            metrics,
        }
    }

    /// Channel an alert is delivered to
    pub fn channel_for(&self, alert: &Alert) -> u64 {
        match alert {
            Alert::Buy(_) | Alert::FloorIncrease { .. } => self.feed_channel_id,
            Alert::MarketUpdate(_) => self.discussion_channel_id,
        }
    }

    /// Attempt delivery once, logging the outcome
    pub async fn dispatch(&self, alert: &Alert) -> Result<(), DeliveryError> {
        let channel_id = self.channel_for(alert);
        let message = alert.format_message();
        let kind = alert.kind();

        match self.notifier.send(channel_id, &message).await {
            Ok(()) => {
                self.metrics.alerts_sent.with_label_values(&[kind]).inc();
                tracing::info!(kind, channel_id, "Alert sent");
                Ok(())
            }
            Err(e) => {
                self.metrics.alert_delivery_failures.with_label_values(&[kind]).inc();
                tracing::error!(error = %e, kind, channel_id, "Failed to deliver alert");
                Err(e)
            }
        }
    }
}

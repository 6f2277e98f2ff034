//! Prometheus metrics for the buy-watch operator
//!
//! Exposes metrics endpoint for monitoring:
//! - Poll cycles per task and outcome
//! - Buys detected and alerts sent/failed
//! - Oracle fallbacks
//! - RPC latency histogram
//! - Last floor price gauge

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Metrics state
pub struct MetricsState {
    /// Prometheus registry
    registry: Registry,
    /// Poll cycles by task and outcome
    pub poll_cycles: IntCounterVec,
    /// Buys detected
    pub buy_events: IntCounter,
    /// Alerts delivered by kind
    pub alerts_sent: IntCounterVec,
    /// Alerts that failed delivery by kind
    pub alert_delivery_failures: IntCounterVec,
    /// Times the oracle fallback rate was used
    pub oracle_fallbacks: IntCounter,
    /// RPC latency histogram (in milliseconds)
    pub rpc_latency: HistogramVec,
    /// Last observed floor price
    pub floor_price: Gauge,
}

impl MetricsState {
    /// Create a new metrics state with all metrics registered
    pub fn new() -> Self {
        let registry = Registry::new();

        let poll_cycles = IntCounterVec::new(
            Opts::new("buywatch_poll_cycles_total", "Monitor ticks by task and outcome"),
            &["task", "outcome"],
        )
        .expect("Failed to create poll_cycles counter");
        registry
            .register(Box::new(poll_cycles.clone()))
            .expect("Failed to register poll_cycles");

        let buy_events = IntCounter::with_opts(Opts::new(
            "buywatch_buy_events_total",
            "Buys classified from ledger transactions",
        ))
        .expect("Failed to create buy_events counter");
        registry
            .register(Box::new(buy_events.clone()))
            .expect("Failed to register buy_events");

        let alerts_sent = IntCounterVec::new(
            Opts::new("buywatch_alerts_sent_total", "Alerts delivered by kind"),
            &["kind"],
        )
        .expect("Failed to create alerts_sent counter");
        registry
            .register(Box::new(alerts_sent.clone()))
            .expect("Failed to register alerts_sent");

        let alert_delivery_failures = IntCounterVec::new(
            Opts::new(
                "buywatch_alert_delivery_failures_total",
                "Alerts that could not be delivered by kind",
            ),
            &["kind"],
        )
        .expect("Failed to create alert_delivery_failures counter");
        registry
            .register(Box::new(alert_delivery_failures.clone()))
            .expect("Failed to register alert_delivery_failures");

        let oracle_fallbacks = IntCounter::with_opts(Opts::new(
            "buywatch_oracle_fallbacks_total",
            "Times the fallback fiat rate was used",
        ))
        .expect("Failed to create oracle_fallbacks counter");
        registry
            .register(Box::new(oracle_fallbacks.clone()))
            .expect("Failed to register oracle_fallbacks");

        let rpc_latency = HistogramVec::new(
            HistogramOpts::new("buywatch_rpc_latency_ms", "Ledger RPC latency in milliseconds")
                .buckets(vec![50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0]),
            &["method"],
        )
        .expect("Failed to create rpc_latency histogram");
        registry
            .register(Box::new(rpc_latency.clone()))
            .expect("Failed to register rpc_latency");

        let floor_price = Gauge::with_opts(Opts::new(
            "buywatch_floor_price",
            "Last observed floor price",
        ))
        .expect("Failed to create floor_price gauge");
        registry
            .register(Box::new(floor_price.clone()))
            .expect("Failed to register floor_price");

        Self {
            registry,
            poll_cycles,
            buy_events,
            alerts_sent,
            alert_delivery_failures,
            oracle_fallbacks,
            rpc_latency,
            floor_price,
        }
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a finished tick
    pub fn record_cycle(&self, task: &str, outcome: &str) {
        self.poll_cycles.with_label_values(&[task, outcome]).inc();
    }
}

impl Default for MetricsState {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics handler - returns Prometheus metrics in text format
///
/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<MetricsState>>) -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = state.registry().gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("Content-Type", "text/plain; version=0.0.4")],
            Vec::new(),
        );
    }

    (
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        buffer,
    )
}

/// Create metrics router
pub fn metrics_router() -> Router<Arc<MetricsState>> {
    Router::new().route("/metrics", get(metrics_handler))
}

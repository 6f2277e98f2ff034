//! HTTP handlers for the buy-watch status API

mod health;
mod market;

pub use health::*;
pub use market::*;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::metrics::{metrics_router, MetricsState};

/// Build the status router
pub fn router(
    app_state: Arc<AppState>,
    market_state: Arc<MarketState>,
    metrics: Arc<MetricsState>,
) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health_check))
        .with_state(app_state);

    let market_routes = Router::new()
        .route("/market", get(market_snapshot))
        .route("/market/announce", post(market_announce))
        .with_state(market_state);

    let api_routes = Router::new().merge(health_routes).merge(market_routes);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_simple))
        .merge(metrics_router().with_state(metrics))
        .layer(TraceLayer::new_for_http())
}

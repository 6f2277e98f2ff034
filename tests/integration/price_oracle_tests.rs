//! Price Oracle Integration Tests
//!
//! Tests the CoinGecko client against a local quote server:
//! - Successful quotes and caching
//! - Fallback on rate limiting, bad status and bad bodies

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use buywatch_operator::config::OracleConfig;
use buywatch_operator::metrics::MetricsState;
use buywatch_operator::price_oracle::{CoinGeckoOracle, PriceOracle, PriceSource};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::support::{metrics, spawn_server};

#[derive(Clone)]
struct QuoteServer {
    status: StatusCode,
    body: Value,
    hits: Arc<AtomicUsize>,
}

async fn quote(State(server): State<QuoteServer>) -> impl IntoResponse {
    server.hits.fetch_add(1, Ordering::SeqCst);
    (server.status, Json(server.body))
}

async fn oracle_for(
    status: StatusCode,
    body: Value,
) -> (CoinGeckoOracle, Arc<AtomicUsize>, Arc<MetricsState>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/simple/price", get(quote))
        .with_state(QuoteServer {
            status,
            body,
            hits: hits.clone(),
        });
    let base = spawn_server(app).await;

    let config = OracleConfig {
        url: format!("{}/simple/price", base),
        timeout_secs: 2,
        ..OracleConfig::default()
    };
    let metrics = metrics();
    let oracle = CoinGeckoOracle::new(&config, metrics.clone()).unwrap();
    (oracle, hits, metrics)
}

#[tokio::test]
async fn test_live_quote_is_used_and_cached() {
    let (oracle, hits, metrics) =
        oracle_for(StatusCode::OK, json!({ "solana": { "usd": 142.5 } })).await;

    let first = oracle.current_quote().await;
    let second = oracle.current_quote().await;

    assert_eq!(first.source, PriceSource::CoinGecko);
    assert_eq!(first.rate, Decimal::new(1425, 1));
    assert_eq!(second.rate, first.rate);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(metrics.oracle_fallbacks.get(), 0);
}

#[tokio::test]
async fn test_rate_limited_falls_back() {
    let (oracle, _, metrics) = oracle_for(StatusCode::TOO_MANY_REQUESTS, json!({})).await;

    assert_eq!(oracle.native_usd_rate().await, Some(Decimal::from(150)));
    assert_eq!(metrics.oracle_fallbacks.get(), 1);
}

#[tokio::test]
async fn test_server_error_falls_back() {
    let (oracle, _, _) = oracle_for(StatusCode::INTERNAL_SERVER_ERROR, json!({})).await;
    assert_eq!(oracle.current_quote().await.source, PriceSource::Fallback);
}

#[tokio::test]
async fn test_missing_asset_falls_back() {
    let (oracle, _, _) =
        oracle_for(StatusCode::OK, json!({ "ethereum": { "usd": 3000 } })).await;
    assert_eq!(oracle.native_usd_rate().await, Some(Decimal::from(150)));
}

#[tokio::test]
async fn test_fallback_is_not_cached() {
    let (oracle, hits, _) = oracle_for(StatusCode::INTERNAL_SERVER_ERROR, json!({})).await;

    oracle.current_quote().await;
    oracle.current_quote().await;

    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_zero_quote_is_reported_as_zero() {
    let (oracle, _, metrics) =
        oracle_for(StatusCode::OK, json!({ "solana": { "usd": 0 } })).await;

    let quote = oracle.current_quote().await;

    assert_eq!(quote.source, PriceSource::CoinGecko);
    assert_eq!(quote.rate, Decimal::ZERO);
    assert_eq!(metrics.oracle_fallbacks.get(), 0);
}

#[tokio::test]
async fn test_negative_quote_falls_back() {
    let (oracle, _, _) =
        oracle_for(StatusCode::OK, json!({ "solana": { "usd": -1 } })).await;
    assert_eq!(oracle.native_usd_rate().await, Some(Decimal::from(150)));
}

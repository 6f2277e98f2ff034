//! Price Data Provider Integration Tests
//!
//! Tests the snapshot provider against a local snapshot endpoint:
//! - Display strings and plain numbers
//! - Missing, garbage and negative values are unavailable
//! - Snapshot collection across all metrics from a single request

use axum::{http::StatusCode, routing::get, Json, Router};
use buywatch_operator::models::PriceMetric;
use buywatch_operator::price_data::{collect_snapshot, HttpPriceDataProvider, PriceDataProvider};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::support::spawn_server;

async fn provider_for(body: Value) -> HttpPriceDataProvider {
    let app = Router::new().route(
        "/snapshot",
        get(move || {
            let body = body.clone();
            async move { Json(body) }
        }),
    );
    let base = spawn_server(app).await;
    HttpPriceDataProvider::new(format!("{}/snapshot", base), Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_reads_display_strings_and_numbers() {
    let provider = provider_for(json!({
        "mint_price": "$1,234.50",
        "floor_price": 10.25,
        "secondary_price": "0.42 USDC"
    }))
    .await;

    assert_eq!(
        provider.fetch(PriceMetric::MintPrice).await.unwrap(),
        Decimal::new(123450, 2)
    );
    assert_eq!(
        provider.fetch(PriceMetric::FloorPrice).await.unwrap(),
        Decimal::new(1025, 2)
    );
    assert_eq!(
        provider.fetch(PriceMetric::SecondaryPrice).await.unwrap(),
        Decimal::new(42, 2)
    );
}

#[tokio::test]
async fn test_bad_values_are_unavailable() {
    let provider = provider_for(json!({
        "mint_price": "Sold out",
        "floor_price": "-3",
        "secondary_price": null
    }))
    .await;

    assert!(provider.fetch(PriceMetric::MintPrice).await.is_err());
    assert!(provider.fetch(PriceMetric::FloorPrice).await.is_err());
    assert!(provider.fetch(PriceMetric::SecondaryPrice).await.is_err());
}

#[tokio::test]
async fn test_endpoint_failure_is_unavailable() {
    let app = Router::new().route("/snapshot", get(|| async { StatusCode::BAD_GATEWAY }));
    let base = spawn_server(app).await;
    let provider =
        HttpPriceDataProvider::new(format!("{}/snapshot", base), Duration::from_secs(2)).unwrap();

    let err = provider.fetch(PriceMetric::FloorPrice).await.unwrap_err();
    assert!(err.to_string().contains("floor_price"), "got {}", err);
}

#[tokio::test]
async fn test_collect_snapshot_marks_missing_metrics() {
    let provider = provider_for(json!({ "mint_price": "2.00", "floor_price": "1.5" })).await;

    let snapshot = collect_snapshot(&provider).await;

    assert_eq!(snapshot.mint_price, Some(Decimal::new(200, 2)));
    assert_eq!(snapshot.floor_price, Some(Decimal::new(15, 1)));
    assert_eq!(snapshot.secondary_price, None);
    assert_eq!(snapshot.available_count(), 2);
}

#[tokio::test]
async fn test_snapshot_is_fetched_once_per_collection() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().route(
        "/snapshot",
        get(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                Json(json!({
                    "mint_price": "2.00",
                    "floor_price": 0.0000001,
                    "secondary_price": "0.42 USDC"
                }))
            }
        }),
    );
    let base = spawn_server(app).await;
    let provider =
        HttpPriceDataProvider::new(format!("{}/snapshot", base), Duration::from_secs(2)).unwrap();

    let snapshot = collect_snapshot(&provider).await;

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(snapshot.floor_price, Some(Decimal::new(1, 7)));
    assert_eq!(snapshot.available_count(), 3);
}

#[tokio::test]
async fn test_endpoint_failure_empties_snapshot() {
    let app = Router::new().route("/snapshot", get(|| async { StatusCode::BAD_GATEWAY }));
    let base = spawn_server(app).await;
    let provider =
        HttpPriceDataProvider::new(format!("{}/snapshot", base), Duration::from_secs(2)).unwrap();

    let readings = provider.fetch_all().await;

    assert!(readings.mint_price.is_err());
    assert!(readings.floor_price.is_err());
    assert!(readings.secondary_price.is_err());
}

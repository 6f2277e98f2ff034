//! Market snapshot endpoints
//!
//! Stand-in for the chat price command: the snapshot can be read as JSON or
//! announced to the discussion channel.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::MarketSnapshot;
use crate::notifications::{Alert, AlertDispatcher};
use crate::price_data::{collect_snapshot, PriceDataProvider};

/// Shared state for market routes
pub struct MarketState {
    /// Price data source; `None` when not configured
    pub provider: Option<Arc<dyn PriceDataProvider>>,
    /// Alert dispatcher
    pub dispatcher: Arc<AlertDispatcher>,
}

impl MarketState {
    async fn snapshot(&self) -> MarketSnapshot {
        match &self.provider {
            Some(provider) => collect_snapshot(provider.as_ref()).await,
            None => MarketSnapshot {
                mint_price: None,
                floor_price: None,
                secondary_price: None,
                fetched_at: Utc::now(),
            },
        }
    }
}

/// Announce response
#[derive(Debug, Serialize)]
pub struct AnnounceResponse {
    pub status: &'static str,
    pub channel_id: u64,
    pub snapshot: MarketSnapshot,
}

/// Current market snapshot
///
/// GET /api/v1/market
pub async fn market_snapshot(State(state): State<Arc<MarketState>>) -> Json<MarketSnapshot> {
    Json(state.snapshot().await)
}

/// Post a market update to the discussion channel
///
/// POST /api/v1/market/announce
pub async fn market_announce(
    State(state): State<Arc<MarketState>>,
) -> AppResult<Json<AnnounceResponse>> {
    let snapshot = state.snapshot().await;
    let alert = Alert::MarketUpdate(snapshot.clone());
    let channel_id = state.dispatcher.channel_for(&alert);

    state
        .dispatcher
        .dispatch(&alert)
        .await
        .map_err(|e| AppError::Delivery(e.to_string()))?;

    Ok(Json(AnnounceResponse {
        status: "sent",
        channel_id,
        snapshot,
    }))
}

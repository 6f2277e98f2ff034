//! Health check endpoint

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::monitoring::StatusReceivers;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall system status
    pub status: HealthStatus,
    /// Uptime in seconds
    pub uptime_seconds: i64,
    /// Ledger task status
    pub ledger: TaskHealth,
    /// Floor task status
    pub floor: FloorTaskHealth,
}

/// Health status enum
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All tasks ticking on schedule
    Healthy,
    /// A task has missed several ticks
    Degraded,
}

/// Ledger task health
#[derive(Debug, Serialize)]
pub struct TaskHealth {
    pub status: HealthStatus,
    pub cycles: u64,
    pub last_tick_at: Option<DateTime<Utc>>,
    pub last_signature: Option<String>,
    pub buys_detected: u64,
}

/// Floor task health
#[derive(Debug, Serialize)]
pub struct FloorTaskHealth {
    pub enabled: bool,
    pub status: HealthStatus,
    pub cycles: u64,
    pub last_tick_at: Option<DateTime<Utc>>,
    pub last_floor_price: Option<Decimal>,
    pub increases_alerted: u64,
}

/// Shared application state for health checks
pub struct AppState {
    /// Application start time
    pub started_at: DateTime<Utc>,
    /// Published task statuses
    pub status: StatusReceivers,
    /// Ledger poll interval
    pub ledger_interval: Duration,
    /// Floor check interval
    pub floor_interval: Duration,
}

/// Ticks a task may miss before it is reported degraded
const STALE_TICKS: u32 = 3;

/// A task is stale once it has gone `STALE_TICKS` intervals without a tick.
/// Before its first tick the start time is the reference.
fn task_status(
    last_tick_at: Option<DateTime<Utc>>,
    started_at: DateTime<Utc>,
    interval: Duration,
    now: DateTime<Utc>,
) -> HealthStatus {
    let reference = last_tick_at.unwrap_or(started_at);
    let elapsed = (now - reference).to_std().unwrap_or_default();

    if elapsed > interval * STALE_TICKS {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

/// Health check handler
///
/// GET /api/v1/health
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let now = Utc::now();
    let uptime = (now - state.started_at).num_seconds();

    let ledger = state.status.ledger();
    let floor = state.status.floor();

    let ledger_status = task_status(
        ledger.last_tick_at,
        state.started_at,
        state.ledger_interval,
        now,
    );
    let floor_status = if floor.enabled {
        task_status(floor.last_tick_at, state.started_at, state.floor_interval, now)
    } else {
        HealthStatus::Healthy
    };

    let overall_status = if ledger_status == HealthStatus::Degraded
        || floor_status == HealthStatus::Degraded
    {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    };

    let response = HealthResponse {
        status: overall_status,
        uptime_seconds: uptime,
        ledger: TaskHealth {
            status: ledger_status,
            cycles: ledger.cycles,
            last_tick_at: ledger.last_tick_at,
            last_signature: ledger.last_signature,
            buys_detected: ledger.buys_detected,
        },
        floor: FloorTaskHealth {
            enabled: floor.enabled,
            status: floor_status,
            cycles: floor.cycles,
            last_tick_at: floor.last_tick_at,
            last_floor_price: floor.last_floor_price,
            increases_alerted: floor.increases_alerted,
        },
    };

    // Still 200 for degraded
    (StatusCode::OK, Json(response))
}

/// Simple health check (for load balancers)
///
/// GET /health
pub async fn health_simple() -> StatusCode {
    StatusCode::OK
}

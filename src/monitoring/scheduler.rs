//! Monitor task scheduler
//!
//! Runs the ledger poller and the floor tracker as two independent periodic
//! tasks. Each task owns its half of `MonitorState` and moves it through a
//! spawned future on every tick, so a panic inside one tick is reported as a
//! join error, the state from before the tick is restored, and the loop keeps
//! going. Missed ticks are skipped rather than bursted.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::floor_tracker::{FloorCheck, FloorTracker};
use super::ledger_poller::LedgerPoller;
use super::state::{
    FloorState, FloorStatus, LedgerCursor, LedgerStatus, MonitorState, StatusReceivers,
};
use crate::metrics::MetricsState;

/// Intervals for the two monitor tasks
#[derive(Debug, Clone, Copy)]
pub struct ScheduleConfig {
    pub ledger_interval: Duration,
    pub floor_interval: Duration,
}

/// Handles returned by [`start_monitors`]
pub struct MonitorHandles {
    pub ledger: JoinHandle<()>,
    pub floor: Option<JoinHandle<()>>,
    pub status: StatusReceivers,
}

impl MonitorHandles {
    /// Wait for both tasks to exit after cancellation
    pub async fn join(self) {
        if let Err(e) = self.ledger.await {
            tracing::error!(error = %e, "Ledger task ended abnormally");
        }
        if let Some(floor) = self.floor {
            if let Err(e) = floor.await {
                tracing::error!(error = %e, "Floor task ended abnormally");
            }
        }
    }
}

/// Start both monitor tasks
///
/// The floor task is only spawned when a tracker is supplied; otherwise its
/// published status stays disabled.
pub fn start_monitors(
    state: MonitorState,
    poller: Arc<LedgerPoller>,
    tracker: Option<Arc<FloorTracker>>,
    config: ScheduleConfig,
    metrics: Arc<MetricsState>,
    cancel_token: CancellationToken,
) -> MonitorHandles {
    let MonitorState { ledger, floor } = state;

    let (ledger_tx, ledger_rx) = watch::channel(LedgerStatus {
        last_signature: ledger.last_signature().map(str::to_string),
        ..LedgerStatus::default()
    });
    let (floor_tx, floor_rx) = watch::channel(FloorStatus {
        enabled: tracker.is_some(),
        last_floor_price: floor.last_floor_price(),
        ..FloorStatus::default()
    });

    let ledger_handle = tokio::spawn(run_ledger_task(
        ledger,
        poller,
        config.ledger_interval,
        ledger_tx,
        metrics.clone(),
        cancel_token.clone(),
    ));

    let floor_handle = match tracker {
        Some(tracker) => Some(tokio::spawn(run_floor_task(
            floor,
            tracker,
            config.floor_interval,
            floor_tx,
            metrics,
            cancel_token,
        ))),
        None => {
            tracing::info!("No price data source configured, floor tracking disabled");
            None
        }
    };

    MonitorHandles {
        ledger: ledger_handle,
        floor: floor_handle,
        status: StatusReceivers {
            ledger: ledger_rx,
            floor: floor_rx,
        },
    }
}

async fn run_ledger_task(
    mut cursor: LedgerCursor,
    poller: Arc<LedgerPoller>,
    period: Duration,
    status_tx: watch::Sender<LedgerStatus>,
    metrics: Arc<MetricsState>,
    cancel_token: CancellationToken,
) {
    tracing::info!(interval_secs = period.as_secs(), "Starting ledger task");

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                tracing::info!("Ledger task shutting down");
                break;
            }
            _ = interval.tick() => {
                let backup = cursor.clone();
                let tick_poller = poller.clone();
                let tick = tokio::spawn(async move {
                    let outcome = tick_poller.run_cycle(&mut cursor).await;
                    (cursor, outcome)
                });

                let (outcome_label, buys) = match tick.await {
                    Ok((returned, outcome)) => {
                        cursor = returned;
                        (outcome.outcome(), outcome.buys().len() as u64)
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            "Ledger tick panicked, keeping previous cursor"
                        );
                        cursor = backup;
                        ("panicked", 0)
                    }
                };

                metrics.record_cycle("ledger", outcome_label);
                status_tx.send_modify(|status| {
                    status.last_signature = cursor.last_signature().map(str::to_string);
                    status.cycles += 1;
                    status.buys_detected += buys;
                    status.last_tick_at = Some(Utc::now());
                });
            }
        }
    }
}

async fn run_floor_task(
    mut floor: FloorState,
    tracker: Arc<FloorTracker>,
    period: Duration,
    status_tx: watch::Sender<FloorStatus>,
    metrics: Arc<MetricsState>,
    cancel_token: CancellationToken,
) {
    tracing::info!(interval_secs = period.as_secs(), "Starting floor task");

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                tracing::info!("Floor task shutting down");
                break;
            }
            _ = interval.tick() => {
                let backup = floor.clone();
                let tick_tracker = tracker.clone();
                let tick = tokio::spawn(async move {
                    let check = tick_tracker.run_cycle(&mut floor).await;
                    (floor, check)
                });

                let (outcome_label, increased) = match tick.await {
                    Ok((returned, check)) => {
                        floor = returned;
                        (check.outcome(), matches!(check, FloorCheck::Increased { .. }))
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Floor tick panicked, keeping previous value");
                        floor = backup;
                        ("panicked", false)
                    }
                };

                metrics.record_cycle("floor", outcome_label);
                status_tx.send_modify(|status| {
                    status.last_floor_price = floor.last_floor_price();
                    status.cycles += 1;
                    if increased {
                        status.increases_alerted += 1;
                    }
                    status.last_tick_at = Some(Utc::now());
                });
            }
        }
    }
}

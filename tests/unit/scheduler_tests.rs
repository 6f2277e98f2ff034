//! Scheduler Unit Tests
//!
//! Runs both monitor tasks on short intervals and checks:
//! - Status is published after every tick
//! - A panicking tick does not stop the task
//! - Cancellation stops both tasks

use buywatch_operator::metrics::MetricsState;
use buywatch_operator::monitoring::{
    start_monitors, FloorTracker, LedgerPoller, LedgerPollerConfig, LedgerRpc, MonitorState,
    ScheduleConfig, TransactionClassifier,
};
use buywatch_operator::notifications::AlertDispatcher;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::fakes::*;

fn poller(
    rpc: Arc<dyn LedgerRpc>,
    dispatcher: Arc<AlertDispatcher>,
    metrics: Arc<MetricsState>,
) -> Arc<LedgerPoller> {
    Arc::new(LedgerPoller::new(
        rpc,
        Arc::new(FixedOracle(Some(Decimal::from(150)))),
        TransactionClassifier::new(TEAM, Decimal::new(1, 2)),
        dispatcher,
        LedgerPollerConfig {
            token_address: TOKEN.to_string(),
            signature_limit: 10,
            catch_up_limit: 3,
        },
        metrics,
    ))
}

fn schedule() -> ScheduleConfig {
    ScheduleConfig {
        ledger_interval: Duration::from_millis(20),
        floor_interval: Duration::from_millis(20),
    }
}

async fn wait_for<F: Fn() -> bool>(condition: F) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met in time");
}

#[tokio::test]
async fn test_both_tasks_publish_status() {
    let metrics = Arc::new(MetricsState::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let dispatcher = Arc::new(AlertDispatcher::new(
        notifier.clone(),
        FEED_CHANNEL,
        DISCUSSION_CHANNEL,
        metrics.clone(),
    ));

    let ledger = Arc::new(FakeLedger::new());
    ledger.push_listing(&["s1"]);
    ledger.push_listing(&["s2", "s1"]);
    ledger.add_transaction(buy_record("s2", BUYER, 1_000_000_000));

    let provider = ScriptedProvider::new(&[Some(Decimal::ONE), Some(Decimal::TWO)]);
    let tracker = Arc::new(FloorTracker::new(
        Arc::new(provider),
        dispatcher.clone(),
        Duration::from_secs(1),
        metrics.clone(),
    ));

    let cancel = CancellationToken::new();
    let handles = start_monitors(
        MonitorState::new(),
        poller(ledger.clone(), dispatcher, metrics.clone()),
        Some(tracker),
        schedule(),
        metrics.clone(),
        cancel.clone(),
    );
    let status = handles.status.clone();

    wait_for(|| status.ledger().cycles >= 3 && status.floor().cycles >= 3).await;
    cancel.cancel();
    handles.join().await;

    let ledger_status = status.ledger();
    assert_eq!(ledger_status.last_signature.as_deref(), Some("s2"));
    assert_eq!(ledger_status.buys_detected, 1);
    assert!(ledger_status.last_tick_at.is_some());

    let floor_status = status.floor();
    assert!(floor_status.enabled);
    assert_eq!(floor_status.last_floor_price, Some(Decimal::TWO));
    assert_eq!(floor_status.increases_alerted, 1);

    assert_eq!(notifier.sent().len(), 2);
    assert_eq!(metrics.poll_cycles.with_label_values(&["ledger", "initialized"]).get(), 1);
}

#[tokio::test]
async fn test_panicking_tick_keeps_task_alive() {
    let metrics = Arc::new(MetricsState::new());
    let dispatcher = Arc::new(AlertDispatcher::new(
        Arc::new(RecordingNotifier::new()),
        FEED_CHANNEL,
        DISCUSSION_CHANNEL,
        metrics.clone(),
    ));

    let cancel = CancellationToken::new();
    let handles = start_monitors(
        MonitorState::new(),
        poller(Arc::new(PanickingLedger::default()), dispatcher, metrics.clone()),
        None,
        schedule(),
        metrics.clone(),
        cancel.clone(),
    );
    let status = handles.status.clone();

    wait_for(|| status.ledger().last_signature.is_some()).await;
    cancel.cancel();
    handles.join().await;

    assert_eq!(metrics.poll_cycles.with_label_values(&["ledger", "panicked"]).get(), 1);
    assert_eq!(status.ledger().last_signature.as_deref(), Some("head"));
    assert!(!status.floor().enabled);
    assert_eq!(status.floor().cycles, 0);
}

#[tokio::test]
async fn test_cancellation_stops_tasks() {
    let metrics = Arc::new(MetricsState::new());
    let dispatcher = Arc::new(AlertDispatcher::new(
        Arc::new(RecordingNotifier::new()),
        FEED_CHANNEL,
        DISCUSSION_CHANNEL,
        metrics.clone(),
    ));
    let ledger = Arc::new(FakeLedger::new());

    let cancel = CancellationToken::new();
    let handles = start_monitors(
        MonitorState::new(),
        poller(ledger.clone(), dispatcher, metrics.clone()),
        None,
        schedule(),
        metrics,
        cancel.clone(),
    );

    wait_for(|| ledger.listing_calls() >= 1).await;
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), handles.join())
        .await
        .expect("tasks did not stop after cancellation");

    let calls = ledger.listing_calls();
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(ledger.listing_calls(), calls);
}

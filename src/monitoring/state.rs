//! Monitor state
//!
//! `MonitorState` is split by value between the two monitor tasks: the ledger
//! task owns the signature cursor and the floor task owns the last floor
//! reading. Neither field is shared, so no lock guards them. Each task
//! publishes a read-only status copy through a `watch` channel for the status API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::watch;

/// Last processed signature of the watched address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerCursor {
    last_signature: Option<String>,
}

impl LedgerCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_signature(&self) -> Option<&str> {
        self.last_signature.as_deref()
    }

    pub fn is_initialized(&self) -> bool {
        self.last_signature.is_some()
    }

    /// Move the cursor to `latest`, the head of the most recent listing
    pub fn advance(&mut self, latest: &str) {
        if self.last_signature.as_deref() != Some(latest) {
            self.last_signature = Some(latest.to_string());
        }
    }
}

/// Last observed floor price
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FloorState {
    last_floor_price: Option<Decimal>,
}

impl FloorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_floor_price(&self) -> Option<Decimal> {
        self.last_floor_price
    }

    /// Store a new reading and return the one it replaced
    pub fn record(&mut self, value: Decimal) -> Option<Decimal> {
        self.last_floor_price.replace(value)
    }
}

/// In-memory monitor state; a restart resets both cursors
#[derive(Debug, Clone, Default)]
pub struct MonitorState {
    pub ledger: LedgerCursor,
    pub floor: FloorState,
}

impl MonitorState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Ledger task status, published after every tick
#[derive(Debug, Clone, Default, Serialize)]
pub struct LedgerStatus {
    pub last_signature: Option<String>,
    pub cycles: u64,
    pub buys_detected: u64,
    pub last_tick_at: Option<DateTime<Utc>>,
}

/// Floor task status, published after every tick
#[derive(Debug, Clone, Default, Serialize)]
pub struct FloorStatus {
    pub enabled: bool,
    pub last_floor_price: Option<Decimal>,
    pub cycles: u64,
    pub increases_alerted: u64,
    pub last_tick_at: Option<DateTime<Utc>>,
}

/// Receivers for both task statuses
#[derive(Debug, Clone)]
pub struct StatusReceivers {
    pub ledger: watch::Receiver<LedgerStatus>,
    pub floor: watch::Receiver<FloorStatus>,
}

impl StatusReceivers {
    pub fn ledger(&self) -> LedgerStatus {
        self.ledger.borrow().clone()
    }

    pub fn floor(&self) -> FloorStatus {
        self.floor.borrow().clone()
    }
}

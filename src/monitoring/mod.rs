//! Monitoring module for buy detection and floor tracking
//!
//! Polls the ledger for new signatures of the watched token, classifies
//! buys, and tracks the collection floor price on a separate cadence.

pub mod classifier;
pub mod floor_tracker;
pub mod ledger_poller;
pub mod rpc_client;
pub mod scheduler;
pub mod state;

pub use classifier::{Rejection, TransactionClassifier};
pub use floor_tracker::{FloorCheck, FloorTracker};
pub use ledger_poller::{LedgerPoller, LedgerPollerConfig, PollOutcome};
pub use rpc_client::{JsonRpcClient, LedgerRpc, SignatureInfo, TransactionRecord};
pub use scheduler::{start_monitors, MonitorHandles, ScheduleConfig};
pub use state::{FloorState, FloorStatus, LedgerCursor, LedgerStatus, MonitorState, StatusReceivers};

//! Domain models shared by the monitors, dispatcher and status API

pub mod buy;
pub mod market;

pub use buy::{BuyCandidate, BuyEvent};
pub use market::{FloorSample, MarketSnapshot, PriceMetric};

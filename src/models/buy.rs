//! Buy models - purchases inferred from native balance deltas

use rust_decimal::Decimal;
use serde::Serialize;

/// Buyer and spend extracted from a transaction, before fiat enrichment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyCandidate {
    /// Account whose native balance decreased
    pub buyer: String,
    /// Native units spent
    pub sol_amount: Decimal,
}

/// A classified purchase
///
/// Created only by the classifier path and consumed once by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuyEvent {
    /// Buyer address
    pub buyer: String,
    /// Native units spent
    pub sol_amount: Decimal,
    /// Fiat value of the spend; zero when no rate was available
    pub usd_amount: Decimal,
    /// Transaction signature
    pub signature: String,
}

impl BuyEvent {
    /// Enrich a candidate with a fiat rate
    pub fn from_candidate(
        candidate: BuyCandidate,
        signature: String,
        usd_rate: Option<Decimal>,
    ) -> Self {
        let usd_amount = usd_rate
            .map(|rate| candidate.sol_amount * rate)
            .unwrap_or(Decimal::ZERO);

        Self {
            buyer: candidate.buyer,
            sol_amount: candidate.sol_amount,
            usd_amount,
            signature,
        }
    }
}

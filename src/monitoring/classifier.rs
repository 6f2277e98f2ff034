//! Buy classifier
//!
//! Approximates a "buy" as: someone other than the team wallet lost native
//! balance in a successful transaction that touches the token or system
//! program. This is a heuristic, not an authoritative parse of the
//! instruction data; a fee payer in an unrelated transfer that exceeds the
//! threshold is reported as a buyer.

use rust_decimal::Decimal;

use crate::constants::programs;
use crate::models::BuyCandidate;
use crate::monitoring::rpc_client::TransactionRecord;
use crate::utils::lamports_to_sol;

/// Why a record was not classified as a buy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The ledger reported an execution error
    ExecutionError,
    /// No instruction invokes a recognised program
    NoRecognizedProgram,
    /// No non-team account lost native balance
    NoBalanceDecrease,
    /// Every non-team decrease is at or below the minimum spend
    BelowThreshold,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::ExecutionError => write!(f, "execution_error"),
            Rejection::NoRecognizedProgram => write!(f, "no_recognized_program"),
            Rejection::NoBalanceDecrease => write!(f, "no_balance_decrease"),
            Rejection::BelowThreshold => write!(f, "below_threshold"),
        }
    }
}

/// Classifies raw transactions as buys of the watched token
#[derive(Debug, Clone)]
pub struct TransactionClassifier {
    team_wallet: String,
    min_buy_sol: Decimal,
}

impl TransactionClassifier {
    pub fn new(team_wallet: impl Into<String>, min_buy_sol: Decimal) -> Self {
        Self {
            team_wallet: team_wallet.into(),
            min_buy_sol,
        }
    }

    /// Return the buy in `record`, if any
    pub fn classify(&self, record: &TransactionRecord) -> Option<BuyCandidate> {
        self.evaluate(record).ok()
    }

    /// Classify `record`, reporting the first rejection condition that applies
    ///
    /// The buyer is the first account in address-list order whose balance
    /// decreased by more than the minimum spend and that is not the team wallet.
    pub fn evaluate(&self, record: &TransactionRecord) -> Result<BuyCandidate, Rejection> {
        if record.has_error() {
            return Err(Rejection::ExecutionError);
        }

        let touches_program = record
            .program_ids()
            .any(|program| programs::RECOGNIZED.contains(&program));
        if !touches_program {
            return Err(Rejection::NoRecognizedProgram);
        }

        let mut saw_decrease = false;
        for (address, pre, post) in record.native_balances() {
            if pre <= post || address == self.team_wallet {
                continue;
            }
            saw_decrease = true;

            let sol_spent = lamports_to_sol(pre - post);
            if sol_spent > self.min_buy_sol {
                return Ok(BuyCandidate {
                    buyer: address.to_string(),
                    sol_amount: sol_spent,
                });
            }
        }

        if saw_decrease {
            Err(Rejection::BelowThreshold)
        } else {
            Err(Rejection::NoBalanceDecrease)
        }
    }
}

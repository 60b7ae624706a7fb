use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Business-rule failures surfaced by [`Ledger::execute`](crate::Ledger::execute).
///
/// A rejected execution mutates no state and is never retried automatically.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Error)]
pub enum LedgerError {
    #[error("insufficient funds: trade requires {required} USD but only {available} available")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("insufficient holdings: trade requires {required} units but only {available} held")]
    InsufficientHoldings { required: f64, available: f64 },
}

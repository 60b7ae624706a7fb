//! Paper-trading portfolio ledger.
//!
//! Holds the single mutable [`Portfolio`] instance plus the append-only trade
//! history. Every mutation goes through [`Ledger::execute`], whose
//! check-then-update runs inside one critical section so concurrent
//! executions can never interleave past a balance check.

use crate::error::LedgerError;
use crate::event::Side;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Cash and asset balances of the paper portfolio.
///
/// Invariant: `usd >= 0` and `asset >= 0` at every observable point.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Portfolio {
    pub usd: f64,
    pub asset: f64,
}

/// Record of one successfully executed trade. Append-only.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TradeRecord {
    pub id: u64,
    pub side: Side,
    pub price: f64,
    pub amount: f64,
    pub time: DateTime<Utc>,
}

#[derive(Debug)]
struct LedgerState {
    portfolio: Portfolio,
    history: Vec<TradeRecord>,
    next_id: u64,
}

/// Serialized entry point for all portfolio mutations.
///
/// Successful executions are forwarded to an optional history sink channel
/// for durable storage; the send is unbounded and never blocks the critical
/// section.
#[derive(Debug)]
pub struct Ledger {
    state: Mutex<LedgerState>,
    sink: Option<mpsc::UnboundedSender<TradeRecord>>,
}

impl Ledger {
    pub fn new(starting_usd: f64) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                portfolio: Portfolio {
                    usd: starting_usd,
                    asset: 0.0,
                },
                history: Vec::new(),
                next_id: 1,
            }),
            sink: None,
        }
    }

    /// Attach a history sink channel receiving every executed trade.
    pub fn with_sink(mut self, sink: mpsc::UnboundedSender<TradeRecord>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Execute a trade of `amount` units at the caller-supplied `price`.
    ///
    /// All-or-nothing: a rejected execution leaves the portfolio unchanged.
    /// The execution price is deliberately not validated against the market -
    /// this is a paper-trading simulation, and the policy is documented as
    /// such rather than tightened.
    pub fn execute(
        &self,
        side: Side,
        price: f64,
        amount: f64,
    ) -> Result<TradeRecord, LedgerError> {
        let record = {
            let mut state = self.state.lock();

            match side {
                Side::Buy => {
                    let cost = price * amount;
                    if state.portfolio.usd < cost {
                        return Err(LedgerError::InsufficientFunds {
                            required: cost,
                            available: state.portfolio.usd,
                        });
                    }
                    state.portfolio.usd -= cost;
                    state.portfolio.asset += amount;
                }
                Side::Sell => {
                    if state.portfolio.asset < amount {
                        return Err(LedgerError::InsufficientHoldings {
                            required: amount,
                            available: state.portfolio.asset,
                        });
                    }
                    state.portfolio.asset -= amount;
                    state.portfolio.usd += price * amount;
                }
            }

            let record = TradeRecord {
                id: state.next_id,
                side,
                price,
                amount,
                time: Utc::now(),
            };
            state.next_id += 1;
            state.history.push(record.clone());
            record
        };

        info!(
            id = record.id,
            side = %record.side,
            price = record.price,
            amount = record.amount,
            "trade executed"
        );

        if let Some(sink) = &self.sink {
            if sink.send(record.clone()).is_err() {
                debug!("history sink closed, record retained in memory only");
            }
        }

        Ok(record)
    }

    /// Latest committed portfolio balances.
    pub fn portfolio(&self) -> Portfolio {
        self.state.lock().portfolio
    }

    /// Trade history, most recent first, capped at `limit` records.
    pub fn history(&self, limit: usize) -> Vec<TradeRecord> {
        let state = self.state.lock();
        state.history.iter().rev().take(limit).cloned().collect()
    }
}

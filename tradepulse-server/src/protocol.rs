//! Client-facing WebSocket protocol.
//!
//! Every frame is a JSON object. Outbound frames carry a `type` tag; inbound
//! command frames carry an `action` tag. Snapshot frames embed the standard
//! payload shape `{ price, volume, is_whale, stats: { mean_price, std_dev,
//! z_score, status } }`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tradepulse_core::{Ledger, Portfolio, Side, Snapshot, TradeRecord};

/// Command sent by a connected client.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Execute a paper trade at the caller-supplied price; the amount is the
    /// server's configured fixed trade size.
    Execute { side: Side, price: f64 },
    /// Query current portfolio balances.
    Portfolio,
    /// Query recent trade history, most recent first.
    History,
}

/// Message sent to a connected client.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        message: String,
        timestamp: DateTime<Utc>,
    },
    Snapshot {
        #[serde(flatten)]
        snapshot: Snapshot,
    },
    Executed {
        trade_id: u64,
        portfolio: Portfolio,
    },
    Portfolio {
        #[serde(flatten)]
        portfolio: Portfolio,
    },
    History {
        trades: Vec<TradeRecord>,
    },
    Error {
        detail: String,
    },
}

/// Number of records returned by a history query.
const HISTORY_LIMIT: usize = 10;

/// Handle one inbound command frame and produce the reply.
///
/// Unparseable frames and rejected executions both come back as a structured
/// `error { detail }`; neither mutates any state.
pub fn respond(text: &str, ledger: &Ledger, trade_amount: f64) -> ServerMessage {
    let command = match serde_json::from_str::<ClientCommand>(text) {
        Ok(command) => command,
        Err(e) => {
            return ServerMessage::Error {
                detail: format!("invalid command: {e}"),
            };
        }
    };

    match command {
        ClientCommand::Execute { side, price } => {
            match ledger.execute(side, price, trade_amount) {
                Ok(record) => ServerMessage::Executed {
                    trade_id: record.id,
                    portfolio: ledger.portfolio(),
                },
                Err(e) => ServerMessage::Error {
                    detail: e.to_string(),
                },
            }
        }
        ClientCommand::Portfolio => ServerMessage::Portfolio {
            portfolio: ledger.portfolio(),
        },
        ClientCommand::History => ServerMessage::History {
            trades: ledger.history(HISTORY_LIMIT),
        },
    }
}

//! Core data types for trade events and enriched snapshots.
//!
//! These types define the JSON payload streamed to subscribers: one
//! [`Snapshot`] per processed [`TradeEvent`], in arrival order, no batching.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized trade event produced by the exchange feed.
///
/// `volume` is the quote-notional value of the trade (price x quantity).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct TradeEvent {
    pub price: f64,
    pub volume: f64,
    pub time: DateTime<Utc>,
}

/// Anomaly status derived from the rolling z-score.
///
/// `Init` covers the degenerate states (fewer than two samples, or zero
/// variance) where a z-score is undefined - an expected transient, never an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Init,
    Neutral,
    Pump,
    Dump,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Init => "INIT",
            Status::Neutral => "NEUTRAL",
            Status::Pump => "PUMP",
            Status::Dump => "DUMP",
        }
    }

    /// Check if this status flags an anomalous move
    pub fn is_anomalous(&self) -> bool {
        matches!(self, Status::Pump | Status::Dump)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Order side (Buy or Sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Side::Buy)
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rolling statistics computed for one trade event.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SnapshotStats {
    pub mean_price: f64,
    pub std_dev: f64,
    pub z_score: f64,
    pub status: Status,
}

/// Enriched per-event snapshot broadcast to subscribers.
///
/// Immutable once created; subscribers receive their own copies.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Snapshot {
    pub price: f64,
    pub volume: f64,
    pub is_whale: bool,
    pub stats: SnapshotStats,
    pub time: DateTime<Utc>,
}

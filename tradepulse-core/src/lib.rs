//! TradePulse core - streaming statistics & broadcast engine.
//!
//! Consumes a single-symbol stream of normalized trade events, maintains
//! rolling statistics over recent prices, classifies each event
//! (PUMP / DUMP / whale), fans the enriched snapshot out to any number of
//! live subscribers, and keeps a concurrency-safe paper-trading ledger.
//!
//! The library includes:
//! - Core data types for trade events and enriched snapshots
//! - The rolling-window statistics engine and anomaly classifier
//! - A non-blocking multi-subscriber broadcast hub
//! - The serialized portfolio ledger with an async history sink

pub mod classify;
pub mod config;
pub mod error;
pub mod event;
pub mod hub;
pub mod ledger;
pub mod stats;

// Re-export commonly used types for convenience
pub use config::Config;
pub use error::LedgerError;
pub use event::{Side, Snapshot, SnapshotStats, Status, TradeEvent};
pub use hub::{SnapshotHub, SnapshotRx};
pub use ledger::{Ledger, Portfolio, TradeRecord};
pub use stats::RollingStats;

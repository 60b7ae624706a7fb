//! Broadcast hub fanning enriched snapshots out to live subscribers.
//!
//! Publishing never blocks on a slow or unresponsive subscriber: every
//! subscriber sees at most `capacity` pending snapshots, and on overflow the
//! oldest pending snapshots are dropped for that subscriber only (freshness
//! over completeness - a viewer is better served by the latest price than a
//! backlog).

use crate::event::Snapshot;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Multi-subscriber snapshot fan-out.
///
/// Subscribers are registered and removed concurrently with publishing;
/// dropping a [`SnapshotRx`] unsubscribes immediately and reclaims its buffer.
#[derive(Debug, Clone)]
pub struct SnapshotHub {
    tx: broadcast::Sender<Snapshot>,
}

impl SnapshotHub {
    /// Create a hub with the given per-subscriber buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish a snapshot to all current subscribers.
    ///
    /// A no-op when nobody is subscribed; never an error, never blocking.
    pub fn publish(&self, snapshot: Snapshot) {
        if self.tx.send(snapshot).is_err() {
            debug!("snapshot published with no subscribers");
        }
    }

    /// Register a new subscriber.
    ///
    /// The subscription only observes snapshots published after this call.
    pub fn subscribe(&self) -> SnapshotRx {
        SnapshotRx {
            rx: self.tx.subscribe(),
            dropped: 0,
        }
    }

    /// Number of currently connected subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Subscription handle yielding a lazy sequence of snapshots.
#[derive(Debug)]
pub struct SnapshotRx {
    rx: broadcast::Receiver<Snapshot>,
    dropped: u64,
}

impl SnapshotRx {
    /// Receive the next snapshot, or `None` once the hub has shut down.
    ///
    /// Falling behind the publisher is normal under load: the oldest pending
    /// snapshots are skipped and counted, and delivery resumes from the
    /// oldest still buffered.
    pub async fn recv(&mut self) -> Option<Snapshot> {
        loop {
            match self.rx.recv().await {
                Ok(snapshot) => return Some(snapshot),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    self.dropped += skipped;
                    warn!(skipped, "subscriber lagged, dropped oldest snapshots");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Total snapshots dropped for this subscriber due to overflow.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

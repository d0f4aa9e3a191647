//! Fan-out of snapshots to live subscribers.
//!
//! Publishing is fire-and-forget: a sink must never block the tick loop, and
//! a missing or slow subscriber only loses updates.

use crate::core::Snapshot;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// Default number of snapshots a lagging subscriber may fall behind.
pub const DEFAULT_HUB_CAPACITY: usize = 64;

/// Destination for published snapshots.
pub trait SnapshotSink: Send + Sync {
    /// Hand over one snapshot. Returns how many subscribers received it.
    fn publish(&self, snapshot: &Snapshot) -> usize;
}

/// Broadcast hub: a stream of every snapshot plus the latest one.
///
/// Cloning is cheap and all clones share the same channels.
#[derive(Debug, Clone)]
pub struct SnapshotHub {
    updates: broadcast::Sender<Snapshot>,
    latest: Arc<watch::Sender<Option<Snapshot>>>,
}

impl SnapshotHub {
    pub fn new(capacity: usize) -> Self {
        let (updates, _) = broadcast::channel(capacity.max(1));
        let (latest, _) = watch::channel(None);
        Self {
            updates,
            latest: Arc::new(latest),
        }
    }

    /// Subscribe to every snapshot published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.updates.subscribe()
    }

    pub fn latest(&self) -> Option<Snapshot> {
        *self.latest.borrow()
    }

    pub fn subscriber_count(&self) -> usize {
        self.updates.receiver_count()
    }
}

impl Default for SnapshotHub {
    fn default() -> Self {
        Self::new(DEFAULT_HUB_CAPACITY)
    }
}

impl SnapshotSink for SnapshotHub {
    fn publish(&self, snapshot: &Snapshot) -> usize {
        self.latest.send_replace(Some(*snapshot));
        // Err only means nobody is subscribed right now.
        self.updates.send(*snapshot).unwrap_or(0)
    }
}

/// Delivers snapshots to an optional sink.
#[derive(Clone, Default)]
pub struct SnapshotPublisher {
    sink: Option<Arc<dyn SnapshotSink>>,
}

impl SnapshotPublisher {
    pub fn with_sink(sink: Arc<dyn SnapshotSink>) -> Self {
        Self { sink: Some(sink) }
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// Publish if a sink is attached. Returns the number of receivers.
    pub fn publish(&self, snapshot: &Snapshot) -> usize {
        match &self.sink {
            Some(sink) => sink.publish(snapshot),
            None => 0,
        }
    }
}

impl std::fmt::Debug for SnapshotPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotPublisher")
            .field("has_sink", &self.has_sink())
            .finish()
    }
}

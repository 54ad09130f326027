use roster_core::{EntityKind, RawRecord};
use tokio::sync::broadcast;

use crate::config::DEFAULT_UPDATE_BUS_CAP;

/// A record changed elsewhere (another view, another task).
#[derive(Debug, Clone, PartialEq)]
pub struct RecordUpdate {
    pub kind: EntityKind,
    pub raw: RawRecord,
}

/// Broadcast channel for out-of-band record updates.
#[derive(Debug, Clone)]
pub struct UpdateBus {
    tx: broadcast::Sender<RecordUpdate>,
}

impl Default for UpdateBus {
    fn default() -> Self { Self::new(DEFAULT_UPDATE_BUS_CAP) }
}

impl UpdateBus {
    pub fn new(cap: usize) -> Self {
        let (tx, _rx) = broadcast::channel(cap.max(1));
        Self { tx }
    }

    /// Returns how many subscribers will see the update.
    pub fn publish(&self, kind: EntityKind, raw: RawRecord) -> usize { self.tx.send(RecordUpdate { kind, raw }).unwrap_or(0) }

    pub fn subscribe(&self) -> broadcast::Receiver<RecordUpdate> { self.tx.subscribe() }
}

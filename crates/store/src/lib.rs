//! Roster store: the Collection, load sequencing and snapshot publishing

#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use roster_core::{Entity, RawRecord, RecordId};
use rustc_hash::FxHashMap;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Immutable view of a collection at one epoch.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<E> {
    pub epoch: u64,
    pub items: Vec<E>,
}

impl<E> Default for Snapshot<E> {
    fn default() -> Self { Self { epoch: 0, items: Vec::new() } }
}

/// Outcome of a wholesale load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub accepted: usize,
    /// Records whose id normalized to empty.
    pub rejected: usize,
    /// Later records that replaced an earlier one with the same id.
    pub duplicates: usize,
}

/// Ordered, id-indexed sequence of canonical records.
///
/// Insertion order is arrival order. Updates replace in place and removals
/// keep the relative order of everything else. Every change bumps the epoch.
#[derive(Debug, Clone)]
pub struct Collection<E: Entity> {
    epoch: u64,
    items: Vec<E>,
    index: FxHashMap<RecordId, usize>,
}

impl<E: Entity> Default for Collection<E> {
    fn default() -> Self { Self::new() }
}

impl<E: Entity> Collection<E> {
    pub fn new() -> Self { Self { epoch: 0, items: Vec::new(), index: FxHashMap::default() } }

    pub fn epoch(&self) -> u64 { self.epoch }
    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn items(&self) -> &[E] { &self.items }
    pub fn iter(&self) -> std::slice::Iter<'_, E> { self.items.iter() }
    pub fn contains(&self, id: &str) -> bool { self.index.contains_key(id) }
    pub fn position(&self, id: &str) -> Option<usize> { self.index.get(id).copied() }
    pub fn get(&self, id: &str) -> Option<&E> { self.position(id).map(|i| &self.items[i]) }

    /// Normalize and replace the whole collection.
    pub fn load(&mut self, raws: &[RawRecord]) -> LoadReport {
        self.replace_all(raws.iter().map(E::normalize))
    }

    /// Replace the whole collection with already normalized records.
    pub fn replace_all(&mut self, records: impl IntoIterator<Item = E>) -> LoadReport {
        let mut report = LoadReport::default();
        self.items.clear();
        self.index.clear();
        for rec in records {
            if rec.id().is_empty() {
                warn!(kind = %E::KIND, "rejecting record without id");
                metrics::counter!("roster_record_rejected_total", 1u64, "kind" => E::KIND.as_str());
                report.rejected += 1;
                continue;
            }
            match self.index.get(rec.id()) {
                Some(&idx) => {
                    debug!(kind = %E::KIND, id = rec.id(), "duplicate id in load; keeping the later record");
                    self.items[idx] = rec;
                    report.duplicates += 1;
                }
                None => {
                    self.index.insert(rec.id().to_string(), self.items.len());
                    self.items.push(rec);
                    report.accepted += 1;
                }
            }
        }
        self.bump();
        report
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.index.clear();
        self.bump();
    }

    /// Replace the record with the same id. Unknown ids are ignored.
    pub fn replace(&mut self, rec: E) -> bool {
        match self.position(rec.id()) {
            Some(idx) => {
                self.items[idx] = rec;
                self.bump();
                true
            }
            None => false,
        }
    }

    /// Remove by id, keeping the order of the remaining records.
    pub fn remove(&mut self, id: &str) -> Option<E> {
        let idx = self.index.remove(id)?;
        let removed = self.items.remove(idx);
        for slot in self.index.values_mut() {
            if *slot > idx {
                *slot -= 1;
            }
        }
        self.bump();
        Some(removed)
    }

    pub fn freeze(&self) -> Arc<Snapshot<E>> { Arc::new(Snapshot { epoch: self.epoch, items: self.items.clone() }) }

    fn bump(&mut self) {
        self.epoch = self.epoch.saturating_add(1);
        metrics::gauge!("roster_collection_len", self.items.len() as f64, "kind" => E::KIND.as_str());
    }
}

/// Publishes committed collection states to readers on other tasks.
pub struct SnapshotPublisher<E> {
    snap: Arc<ArcSwap<Snapshot<E>>>,
    epoch_tx: watch::Sender<u64>,
    epoch_rx: watch::Receiver<u64>,
}

impl<E> Default for SnapshotPublisher<E> {
    fn default() -> Self { Self::new() }
}

impl<E> SnapshotPublisher<E> {
    pub fn new() -> Self {
        let (epoch_tx, epoch_rx) = watch::channel(0u64);
        Self { snap: Arc::new(ArcSwap::from_pointee(Snapshot::default())), epoch_tx, epoch_rx }
    }

    pub fn store(&self, next: Arc<Snapshot<E>>) {
        let epoch = next.epoch;
        self.snap.store(next);
        let _ = self.epoch_tx.send(epoch);
    }

    pub fn handle(&self) -> SnapshotHandle<E> {
        SnapshotHandle { snap: Arc::clone(&self.snap), epoch_rx: self.epoch_rx.clone() }
    }
}

impl<E: Entity> SnapshotPublisher<E> {
    pub fn publish(&self, coll: &Collection<E>) { self.store(coll.freeze()) }
}

/// Handle for readers to access the current snapshot and subscribe to swaps.
pub struct SnapshotHandle<E> {
    snap: Arc<ArcSwap<Snapshot<E>>>,
    epoch_rx: watch::Receiver<u64>,
}

impl<E> Clone for SnapshotHandle<E> {
    fn clone(&self) -> Self { Self { snap: Arc::clone(&self.snap), epoch_rx: self.epoch_rx.clone() } }
}

impl<E> SnapshotHandle<E> {
    pub fn current(&self) -> Arc<Snapshot<E>> { self.snap.load_full() }
    pub fn subscribe_epoch(&self) -> watch::Receiver<u64> { self.epoch_rx.clone() }
}

/// Monotonic sequence numbers for loads; only the latest issued one may commit.
#[derive(Debug, Default)]
pub struct LoadSequencer {
    latest: AtomicU64,
}

impl LoadSequencer {
    pub fn new() -> Self { Self::default() }

    pub fn next(&self) -> u64 { self.latest.fetch_add(1, Ordering::SeqCst) + 1 }

    pub fn latest(&self) -> u64 { self.latest.load(Ordering::SeqCst) }

    pub fn is_latest(&self, seq: u64) -> bool { seq == self.latest() }
}

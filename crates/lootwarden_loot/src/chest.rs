//! # Processed Chest Set
//!
//! Remembers which containers already received custom loot so a chest is
//! populated at most once. The set is bounded: once full, the oldest location
//! is evicted (FIFO). Saves happen every `save_batch` insertions, on demand,
//! and at shutdown.

use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

use lootwarden_shared::persist::load_snapshot;
use lootwarden_shared::{ChestLocation, PersistResult, SnapshotWriter};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// On-disk form of the set, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChestSnapshot {
    /// Processed chests in insertion order.
    pub chests: Vec<ChestLocation>,
}

#[derive(Debug, Default)]
struct ChestSetInner {
    members: HashSet<ChestLocation>,
    order: VecDeque<ChestLocation>,
    unsaved: usize,
}

impl ChestSetInner {
    fn push(&mut self, location: ChestLocation, capacity: usize) -> Option<ChestLocation> {
        let mut evicted = None;
        if self.order.len() >= capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
                evicted = Some(oldest);
            }
        }
        self.members.insert(location.clone());
        self.order.push_back(location);
        evicted
    }

    fn snapshot(&self) -> ChestSnapshot {
        ChestSnapshot {
            chests: self.order.iter().cloned().collect(),
        }
    }
}

/// Where and how the set persists itself.
#[derive(Clone, Debug)]
pub struct ChestStore {
    path: PathBuf,
    writer: Arc<SnapshotWriter>,
}

impl ChestStore {
    /// Creates a store writing to `path` through `writer`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, writer: Arc<SnapshotWriter>) -> Self {
        Self {
            path: path.into(),
            writer,
        }
    }
}

/// Bounded, FIFO-evicting set of processed chest locations.
#[derive(Debug)]
pub struct ProcessedChestSet {
    inner: Mutex<ChestSetInner>,
    capacity: usize,
    save_batch: usize,
    store: Option<ChestStore>,
}

impl ProcessedChestSet {
    /// Creates an in-memory set.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(ChestSetInner::default()),
            capacity: capacity.max(1),
            save_batch: usize::MAX,
            store: None,
        }
    }

    /// Creates a persistent set, loading any saved state.
    ///
    /// A missing file starts empty. An unreadable file is logged and also
    /// starts empty; it is overwritten on the next save.
    #[must_use]
    pub fn open(capacity: usize, save_batch: usize, store: ChestStore) -> Self {
        let capacity = capacity.max(1);
        let mut inner = ChestSetInner::default();
        match load_snapshot::<ChestSnapshot>(&store.path) {
            Ok(Some(snapshot)) => {
                for location in snapshot.chests {
                    if !inner.members.contains(&location) {
                        inner.push(location, capacity);
                    }
                }
                tracing::info!(chests = inner.order.len(), "Processed chests loaded");
            }
            Ok(None) => {}
            Err(error) => {
                tracing::error!(%error, "Failed to load processed chests, starting empty");
            }
        }
        Self {
            inner: Mutex::new(inner),
            capacity,
            save_batch: save_batch.max(1),
            store: Some(store),
        }
    }

    /// Records a chest. Returns true if it was not already processed.
    pub fn mark_processed(&self, location: ChestLocation) -> bool {
        let mut inner = self.inner.lock();
        if inner.members.contains(&location) {
            return false;
        }
        if let Some(evicted) = inner.push(location, self.capacity) {
            tracing::trace!(%evicted, "Evicted oldest processed chest");
        }
        inner.unsaved += 1;
        if inner.unsaved >= self.save_batch {
            inner.unsaved = 0;
            // Queued under the lock so saves reach the writer in order
            if let Err(error) = self.submit(&inner.snapshot()) {
                tracing::error!(%error, "Failed to queue processed chest save");
            }
        }
        true
    }

    /// Returns true if the chest was already processed.
    #[must_use]
    pub fn contains(&self, location: &ChestLocation) -> bool {
        self.inner.lock().members.contains(location)
    }

    /// Number of remembered chests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    /// Returns true if no chest is remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of remembered chests.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current contents, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> ChestSnapshot {
        self.inner.lock().snapshot()
    }

    /// Saves immediately if there are unsaved insertions.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be encoded or queued.
    pub fn save(&self) -> PersistResult<()> {
        let mut inner = self.inner.lock();
        if inner.unsaved == 0 {
            return Ok(());
        }
        inner.unsaved = 0;
        self.submit(&inner.snapshot())
    }

    fn submit(&self, snapshot: &ChestSnapshot) -> PersistResult<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        store.writer.submit(&store.path, snapshot).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lootwarden_shared::SnapshotWriterConfig;
    use std::time::Duration;

    fn chest(x: i32) -> ChestLocation {
        ChestLocation::new("world", x, 64, 0)
    }

    #[test]
    fn test_mark_processed_is_at_most_once() {
        let set = ProcessedChestSet::new(10);
        assert!(set.mark_processed(chest(1)));
        assert!(!set.mark_processed(chest(1)));
        assert!(set.contains(&chest(1)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_fifo_eviction_at_capacity() {
        let set = ProcessedChestSet::new(10_000);
        for x in 0..10_000 {
            set.mark_processed(chest(x));
        }
        assert_eq!(set.len(), 10_000);
        assert!(set.mark_processed(chest(10_000)));
        assert_eq!(set.len(), 10_000);
        assert!(!set.contains(&chest(0)));
        assert!(set.contains(&chest(1)));
        assert!(set.contains(&chest(10_000)));
    }

    #[test]
    fn test_batch_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed_chests.toml");
        let writer = Arc::new(SnapshotWriter::start(SnapshotWriterConfig::default()));
        let set = ProcessedChestSet::open(100, 3, ChestStore::new(&path, Arc::clone(&writer)));
        for x in 0..3 {
            set.mark_processed(chest(x));
        }
        assert!(writer.flush(Duration::from_secs(5)));

        let reloaded = ProcessedChestSet::open(100, 3, ChestStore::new(&path, writer));
        assert_eq!(reloaded.len(), 3);
        assert!(reloaded.contains(&chest(2)));
    }

    #[test]
    fn test_reload_keeps_newest_when_capacity_shrinks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed_chests.toml");
        let writer = Arc::new(SnapshotWriter::start(SnapshotWriterConfig::default()));
        let set = ProcessedChestSet::open(10, 100, ChestStore::new(&path, Arc::clone(&writer)));
        for x in 0..5 {
            set.mark_processed(chest(x));
        }
        set.save().unwrap();
        assert!(writer.flush(Duration::from_secs(5)));

        let smaller = ProcessedChestSet::open(2, 100, ChestStore::new(&path, writer));
        assert_eq!(smaller.snapshot().chests, vec![chest(3), chest(4)]);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed_chests.toml");
        std::fs::write(&path, "chests = [[[").unwrap();
        let writer = Arc::new(SnapshotWriter::start(SnapshotWriterConfig::default()));
        let set = ProcessedChestSet::open(10, 10, ChestStore::new(&path, writer));
        assert!(set.is_empty());
    }
}

//! # Background Snapshot Writer
//!
//! **Batched Saves Off the Event Thread**
//!
//! Instead of touching the disk inside an event handler, callers:
//! 1. Serialize the state they want saved (cheap, in memory)
//! 2. Push it onto a bounded queue
//! 3. A writer thread drains the queue, keeps only the newest snapshot per
//!    file, and writes each file once per batch (temp file + rename)
//!
//! ## Architecture
//!
//! ```text
//!   Event thread ──┐
//!   Quest timer  ──┼──> [Pending Queue] ──> [Writer Thread] ──> Disk
//!   Chest set    ──┘      (bounded)          (single writer)
//! ```
//!
//! A failed write is logged and counted. The in-memory state stays
//! authoritative until the next successful save.

use parking_lot::{Condvar, Mutex};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while saving or loading durable state.
#[derive(Error, Debug)]
pub enum PersistError {
    /// Filesystem failure.
    #[error("i/o error on {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// State could not be encoded.
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] toml::ser::Error),

    /// A saved file could not be decoded.
    #[error("failed to decode {path}: {source}")]
    Decode {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },

    /// The pending queue is full (backpressure).
    #[error("snapshot queue full")]
    QueueFull,
}

/// Result type for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;

/// Configuration for the snapshot writer.
#[derive(Clone, Debug)]
pub struct SnapshotWriterConfig {
    /// Maximum snapshots handled per batch.
    pub max_batch_size: usize,
    /// Maximum time the writer waits for more snapshots (ms).
    pub max_batch_delay_ms: u64,
    /// Capacity of the pending queue.
    pub queue_capacity: usize,
}

impl Default for SnapshotWriterConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 64,
            max_batch_delay_ms: 250,
            queue_capacity: 1_024,
        }
    }
}

/// Writer statistics.
#[derive(Clone, Debug, Default)]
pub struct WriterStats {
    /// Snapshots submitted and processed.
    pub total_snapshots: u64,
    /// Files actually written (after coalescing).
    pub total_writes: u64,
    /// Batches processed.
    pub total_batches: u64,
    /// Writes that failed.
    pub failed_writes: u64,
}

/// Signal for snapshot completion.
struct CompletionSignal {
    done: AtomicBool,
    condvar: Condvar,
    mutex: Mutex<()>,
}

impl CompletionSignal {
    fn new() -> Self {
        Self {
            done: AtomicBool::new(false),
            condvar: Condvar::new(),
            mutex: Mutex::new(()),
        }
    }

    fn signal(&self) {
        let _guard = self.mutex.lock();
        self.done.store(true, Ordering::Release);
        self.condvar.notify_all();
    }

    fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.done.load(Ordering::Acquire) {
            return true;
        }
        let mut guard = self.mutex.lock();
        if !self.done.load(Ordering::Acquire) {
            self.condvar.wait_for(&mut guard, timeout);
        }
        self.done.load(Ordering::Acquire)
    }
}

/// Handle returned to the caller for tracking a snapshot.
pub struct SnapshotHandle {
    completion: Arc<CompletionSignal>,
    /// Sequence number of the snapshot.
    pub seq: u64,
}

impl SnapshotHandle {
    /// Waits until the snapshot was processed. Returns true if it was.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.completion.wait_timeout(timeout)
    }

    /// Returns true if already processed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.completion.done.load(Ordering::Acquire)
    }
}

/// A pending snapshot. `contents == None` is a flush marker.
struct PendingSnapshot {
    path: PathBuf,
    contents: Option<String>,
    completion: Arc<CompletionSignal>,
}

/// Thread-safe bounded queue of pending snapshots.
struct PendingQueue {
    buffer: Mutex<VecDeque<PendingSnapshot>>,
    not_empty: Condvar,
    max_size: usize,
}

impl PendingQueue {
    fn new(max_size: usize) -> Self {
        Self {
            buffer: Mutex::new(VecDeque::with_capacity(max_size.min(1_024))),
            not_empty: Condvar::new(),
            max_size,
        }
    }

    fn push(&self, entry: PendingSnapshot) -> Result<(), PendingSnapshot> {
        let mut buf = self.buffer.lock();
        if buf.len() >= self.max_size {
            return Err(entry);
        }
        buf.push_back(entry);
        self.not_empty.notify_one();
        Ok(())
    }

    fn drain(&self, max_count: usize, timeout: Duration) -> Vec<PendingSnapshot> {
        let mut buf = self.buffer.lock();
        if buf.is_empty() {
            self.not_empty.wait_for(&mut buf, timeout);
        }
        let count = buf.len().min(max_count);
        buf.drain(..count).collect()
    }

    fn len(&self) -> usize {
        self.buffer.lock().len()
    }
}

/// Background writer for TOML snapshots.
pub struct SnapshotWriter {
    queue: Arc<PendingQueue>,
    seq: AtomicU64,
    writer_handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    stats: Arc<Mutex<WriterStats>>,
}

impl SnapshotWriter {
    /// Starts the writer thread.
    #[must_use]
    pub fn start(config: SnapshotWriterConfig) -> Self {
        let queue = Arc::new(PendingQueue::new(config.queue_capacity));
        let shutdown = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(Mutex::new(WriterStats::default()));

        let writer_queue = Arc::clone(&queue);
        let writer_shutdown = Arc::clone(&shutdown);
        let writer_stats = Arc::clone(&stats);

        let writer_handle = thread::Builder::new()
            .name("lootwarden-persist".into())
            .spawn(move || Self::writer_loop(&writer_queue, &writer_shutdown, &writer_stats, &config));

        let writer_handle = match writer_handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::error!("Failed to start snapshot writer thread: {e}");
                None
            }
        };

        Self {
            queue,
            seq: AtomicU64::new(0),
            writer_handle,
            shutdown,
            stats,
        }
    }

    fn writer_loop(
        queue: &PendingQueue,
        shutdown: &AtomicBool,
        stats: &Mutex<WriterStats>,
        config: &SnapshotWriterConfig,
    ) {
        let timeout = Duration::from_millis(config.max_batch_delay_ms);

        loop {
            let batch = queue.drain(config.max_batch_size, timeout);
            if batch.is_empty() {
                if shutdown.load(Ordering::Acquire) {
                    break;
                }
                continue;
            }
            Self::write_batch(&batch, stats);
        }
    }

    fn write_batch(batch: &[PendingSnapshot], stats: &Mutex<WriterStats>) {
        // Only the newest snapshot per file matters
        let mut latest: HashMap<&Path, &str> = HashMap::new();
        for entry in batch {
            if let Some(contents) = &entry.contents {
                latest.insert(entry.path.as_path(), contents.as_str());
            }
        }

        let mut written = 0u64;
        let mut failed = 0u64;
        for (path, contents) in latest {
            match write_atomic(path, contents) {
                Ok(()) => written += 1,
                Err(e) => {
                    failed += 1;
                    tracing::error!("Snapshot save failed: {e}");
                }
            }
        }

        for entry in batch {
            entry.completion.signal();
        }

        let mut s = stats.lock();
        s.total_snapshots += batch.iter().filter(|e| e.contents.is_some()).count() as u64;
        s.total_writes += written;
        s.failed_writes += failed;
        s.total_batches += 1;
    }

    fn enqueue(&self, path: PathBuf, contents: Option<String>) -> PersistResult<SnapshotHandle> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let completion = Arc::new(CompletionSignal::new());
        let entry = PendingSnapshot {
            path,
            contents,
            completion: Arc::clone(&completion),
        };

        if self.writer_handle.is_none() {
            // No writer thread: save inline so nothing is lost
            Self::write_batch(std::slice::from_ref(&entry), &self.stats);
            return Ok(SnapshotHandle { completion, seq });
        }

        self.queue.push(entry).map_err(|_| PersistError::QueueFull)?;
        Ok(SnapshotHandle { completion, seq })
    }

    /// Serializes `value` and queues it for saving to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the queue is full.
    pub fn submit<T: Serialize>(&self, path: &Path, value: &T) -> PersistResult<SnapshotHandle> {
        let contents = toml::to_string_pretty(value)?;
        self.enqueue(path.to_path_buf(), Some(contents))
    }

    /// Waits until everything queued before this call has been processed.
    ///
    /// Returns false if the timeout expired first.
    pub fn flush(&self, timeout: Duration) -> bool {
        match self.enqueue(PathBuf::new(), None) {
            Ok(handle) => handle.wait_timeout(timeout),
            Err(e) => {
                tracing::warn!("Snapshot flush could not be queued: {e}");
                false
            }
        }
    }

    /// Returns current statistics.
    #[must_use]
    pub fn stats(&self) -> WriterStats {
        self.stats.lock().clone()
    }

    /// Returns the number of queued snapshots.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }
}

impl std::fmt::Debug for SnapshotWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotWriter")
            .field("pending", &self.queue.len())
            .field("running", &self.writer_handle.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for SnapshotWriter {
    fn default() -> Self {
        Self::start(SnapshotWriterConfig::default())
    }
}

impl Drop for SnapshotWriter {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);

        {
            let buf = self.queue.buffer.lock();
            self.queue.not_empty.notify_all();
            drop(buf);
        }

        if let Some(handle) = self.writer_handle.take() {
            let _ = handle.join();
        }
    }
}

/// Writes `contents` to `path` through a temp file and a rename.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file written.
pub fn write_atomic(path: &Path, contents: &str) -> PersistResult<()> {
    let io_err = |source: std::io::Error| PersistError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    {
        let mut file = fs::File::create(&tmp).map_err(io_err)?;
        file.write_all(contents.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
    }
    fs::rename(&tmp, path).map_err(io_err)
}

/// Loads a TOML snapshot. A missing file yields `Ok(None)`.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or decoded.
pub fn load_snapshot<T: DeserializeOwned>(path: &Path) -> PersistResult<Option<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    toml::from_str(&contents)
        .map(Some)
        .map_err(|source| PersistError::Decode {
            path: path.to_path_buf(),
            source,
        })
}

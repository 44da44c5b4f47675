//! Shared churn state: directory index and byte budget
//!
//! The scanner and operator threads share one `ChurnState`. Both the
//! file index and the byte counter live behind a single mutex, matching
//! the original single-critical-section design. Lock holds are always
//! short - a snapshot or a single-key mutation - and never span file
//! I/O.
//!
//! The byte budget is advisory: writers consult the headroom before
//! sizing an operation, but the check and the commit are separate lock
//! acquisitions, so two concurrent writers can both pass the check and
//! transiently overshoot the ceiling. This race is an accepted property
//! of the design, not a bug.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// When a file with this name is present in the target directory,
/// churn operations are paused until it is removed.
pub const PAUSE_SENTINEL: &str = "__pause__";

/// Index and budget contents, guarded by the state mutex
#[derive(Debug, Default)]
struct Inner {
    /// Known regular files in the target directory
    files: HashSet<PathBuf>,

    /// Net bytes added since churn start (may go negative)
    altered: i64,
}

/// Shared state for the churn engine
#[derive(Debug)]
pub struct ChurnState {
    /// Target directory
    dir: PathBuf,

    /// Byte budget ceiling for net growth
    buffer: i64,

    /// Index and budget, under one lock
    inner: Mutex<Inner>,
}

impl ChurnState {
    /// Create state for a target directory with the given byte budget
    pub fn new(dir: impl Into<PathBuf>, buffer: i64) -> Self {
        Self {
            dir: dir.into(),
            buffer,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// The target directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the pause sentinel within the target directory
    pub fn sentinel_path(&self) -> PathBuf {
        self.dir.join(PAUSE_SENTINEL)
    }

    /// Rebuild the index from the filesystem
    ///
    /// Lists top-level regular files (non-recursive; directories and
    /// other entry types are skipped) and atomically replaces the index
    /// contents. The listing happens outside the lock; only the final
    /// swap is guarded. Returns the number of indexed files.
    pub fn scan(&self) -> io::Result<usize> {
        let mut files = HashSet::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.insert(entry.path());
            }
        }

        let count = files.len();
        let mut inner = self.lock();
        inner.files = files;
        debug!(dir = %self.dir.display(), files = count, "Index rebuilt");
        Ok(count)
    }

    /// Snapshot of the indexed paths
    ///
    /// Returns a copy, never a live reference, so callers can iterate
    /// without holding the lock.
    pub fn snapshot(&self) -> Vec<PathBuf> {
        self.lock().files.iter().cloned().collect()
    }

    /// Record a path as present
    pub fn insert(&self, path: PathBuf) {
        self.lock().files.insert(path);
    }

    /// Record a path as removed
    pub fn remove(&self, path: &Path) {
        self.lock().files.remove(path);
    }

    /// Whether a path is currently indexed
    pub fn contains(&self, path: &Path) -> bool {
        self.lock().files.contains(path)
    }

    /// Number of indexed files
    pub fn len(&self) -> usize {
        self.lock().files.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.lock().files.is_empty()
    }

    /// Net bytes added since churn start
    pub fn altered(&self) -> i64 {
        self.lock().altered
    }

    /// Remaining budget: ceiling minus net bytes added
    pub fn headroom(&self) -> i64 {
        let inner = self.lock();
        self.buffer - inner.altered
    }

    /// Apply a byte delta to the budget counter
    pub fn adjust(&self, delta: i64) {
        self.lock().altered += delta;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means a panic while holding a short,
        // I/O-free critical section; the contents are still coherent.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

//! Upload progress shared with streaming callbacks

use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// Bytes transferred so far for one file
///
/// Upload callbacks may fire from whichever thread drives the transfer, so the counter
/// sits behind a mutex.
#[derive(Debug)]
pub struct TransferProgress {
    path: PathBuf,
    total: u64,
    seen: Mutex<u64>,
}

impl TransferProgress {
    pub fn new(path: impl Into<PathBuf>, total: u64) -> Self {
        Self {
            path: path.into(),
            total,
            seen: Mutex::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Record `bytes` more transferred, returning the running total
    pub fn update(&self, bytes: u64) -> u64 {
        let mut seen = self.seen.lock();
        *seen += bytes;
        *seen
    }

    pub fn transferred(&self) -> u64 {
        *self.seen.lock()
    }

    /// Completion percentage; an empty file counts as complete
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.transferred() as f64 / self.total as f64) * 100.0
    }
}

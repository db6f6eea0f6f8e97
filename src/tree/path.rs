//! Path helpers for hash record keys

use crate::error::StorageError;
use std::path::{Path, PathBuf};

/// Resolve `path` to an absolute, symlink-free form
///
/// Uses `dunce` so Windows paths stay in their familiar (non-UNC) form.
pub fn absolute_path(path: &Path) -> Result<PathBuf, StorageError> {
    dunce::canonicalize(path).map_err(|e| StorageError::from_read(path, e))
}

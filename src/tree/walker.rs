//! Filesystem walker for artefact folders

use crate::error::StorageError;
use std::fs::Metadata;
use std::path::PathBuf;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Filesystem entry types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    File {
        path: PathBuf,
        name: String,
        mode: u32,
    },
    Directory {
        path: PathBuf,
        name: String,
        mode: u32,
        depth: usize,
    },
}

impl Entry {
    pub fn path(&self) -> &PathBuf {
        match self {
            Entry::File { path, .. } | Entry::Directory { path, .. } => path,
        }
    }
}

/// Names the walk must never hash
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Directory names pruned with everything beneath them (derived, regenerable data)
    pub excluded_dirs: Vec<String>,
    /// File names skipped at any depth (cached hash markers)
    pub skipped_files: Vec<String>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            excluded_dirs: vec![".extract".to_string()],
            skipped_files: vec!["hash".to_string()],
        }
    }
}

/// Filesystem walker
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
}

impl Walker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            config: WalkerConfig::default(),
        }
    }

    pub fn with_config(root: PathBuf, config: WalkerConfig) -> Self {
        Self { root, config }
    }

    /// Walk the folder and collect every file and directory, the root included
    ///
    /// Entries come back sorted by path. Symlinks and special files are not followed
    /// and not returned.
    pub fn walk(&self) -> Result<Vec<Entry>, StorageError> {
        let mut entries = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_excluded_dir(e));

        for entry in walker {
            let entry = entry.map_err(walk_error)?;
            let file_type = entry.file_type();
            let name = utf8_name(&entry)?;

            if file_type.is_file() {
                if self.config.skipped_files.iter().any(|s| *s == name) {
                    debug!(path = %entry.path().display(), "Skipping hash marker");
                    continue;
                }
                let metadata = entry.metadata().map_err(walk_error)?;
                entries.push(Entry::File {
                    path: entry.path().to_path_buf(),
                    name,
                    mode: permission_bits(&metadata),
                });
            } else if file_type.is_dir() {
                let metadata = entry.metadata().map_err(walk_error)?;
                entries.push(Entry::Directory {
                    path: entry.path().to_path_buf(),
                    name,
                    mode: permission_bits(&metadata),
                    depth: entry.depth(),
                });
            } else {
                debug!(path = %entry.path().display(), "Skipping non-regular entry");
            }
        }

        entries.sort_by(|a, b| a.path().cmp(b.path()));
        Ok(entries)
    }

    fn is_excluded_dir(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        self.config.excluded_dirs.iter().any(|d| *d == name)
    }
}

fn utf8_name(entry: &DirEntry) -> Result<String, StorageError> {
    entry.file_name().to_str().map(str::to_owned).ok_or_else(|| {
        StorageError::InvalidPath(format!(
            "file name is not valid UTF-8: {}",
            entry.path().display()
        ))
    })
}

fn walk_error(err: walkdir::Error) -> StorageError {
    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
    match err.into_io_error() {
        Some(io) => StorageError::from_read(path, io),
        None => StorageError::InvalidPath(format!(
            "filesystem loop detected at {}",
            path.display()
        )),
    }
}

/// Permission bits as reported by `lstat`, without the file-type bits
#[cfg(unix)]
pub fn permission_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
pub fn permission_bits(metadata: &Metadata) -> u32 {
    match (metadata.is_dir(), metadata.permissions().readonly()) {
        (true, _) => 0o755,
        (false, true) => 0o444,
        (false, false) => 0o644,
    }
}

//! Tree builder for computing folder Merkle hashes

use crate::error::StorageError;
use crate::tree::hasher;
use crate::tree::listing::{TreeEntry, TreeListing};
use crate::tree::node::{EntryKind, HashRecord};
use crate::tree::path;
use crate::tree::walker::{Entry, Walker, WalkerConfig};
use crate::types::Digest;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument, trace, warn};

/// The hash of a folder and every record that went into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderHash {
    /// Digest of the folder's own tree listing; the artefact's identity
    pub root: Digest,
    /// Every file and tree record keyed by absolute path
    pub records: BTreeMap<PathBuf, HashRecord>,
}

impl FolderHash {
    /// The hash of a folder that does not exist: the digest of an empty listing
    pub fn empty() -> Self {
        Self {
            root: hasher::digest_string(""),
            records: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, path: &Path) -> Option<&HashRecord> {
        self.records.get(path)
    }

    pub fn file_count(&self) -> usize {
        self.records.values().filter(|r| !r.is_tree()).count()
    }
}

/// Builds the Merkle tree of one artefact folder
pub struct TreeBuilder {
    root: PathBuf,
    walker_config: WalkerConfig,
}

impl TreeBuilder {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            walker_config: WalkerConfig::default(),
        }
    }

    /// Set the reserved names the walk skips
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Hash the folder bottom-up
    ///
    /// Files are hashed first, then directories deepest first, so every directory's
    /// children already have digests when its listing is serialized. Any I/O failure
    /// aborts the whole build.
    #[instrument(skip(self), fields(folder = %self.root.display()))]
    pub fn build(&self) -> Result<FolderHash, StorageError> {
        let start = Instant::now();

        match std::fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(StorageError::InvalidPath(format!(
                    "not a directory: {}",
                    self.root.display()
                )))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Folder does not exist; using empty tree digest");
                return Ok(FolderHash::empty());
            }
            Err(e) => return Err(StorageError::from_read(&self.root, e)),
        }

        let root = path::absolute_path(&self.root)?;
        let entries = Walker::with_config(root.clone(), self.walker_config.clone()).walk()?;
        debug!(entry_count = entries.len(), "Walked folder");

        let mut files = Vec::new();
        let mut directories = Vec::new();
        for entry in entries {
            match entry {
                Entry::File { path, name, mode } => files.push((path, name, mode)),
                Entry::Directory {
                    path,
                    name,
                    mode,
                    depth,
                } => directories.push((path, name, mode, depth)),
            }
        }

        let mut records: BTreeMap<PathBuf, HashRecord> = BTreeMap::new();
        let mut pending: HashMap<PathBuf, Vec<TreeEntry>> = HashMap::new();

        for (file_path, name, mode) in files {
            let digest = hasher::digest_file(&file_path)?;
            trace!(path = %file_path.display(), digest = %digest, "Hashed file");

            if let Some(parent) = file_path.parent() {
                pending
                    .entry(parent.to_path_buf())
                    .or_default()
                    .push(TreeEntry::new(mode, EntryKind::File, digest.to_hex(), name.clone()));
            }
            records.insert(
                file_path.clone(),
                HashRecord {
                    path: file_path,
                    digest,
                    kind: EntryKind::File,
                    name,
                    permission_bits: mode,
                    listing_text: None,
                },
            );
        }

        directories.sort_by(|a, b| b.3.cmp(&a.3).then_with(|| a.0.cmp(&b.0)));

        for (dir_path, name, mode, depth) in directories {
            let children = pending.remove(&dir_path).unwrap_or_default();
            let listing_text = TreeListing::new(children).render();
            let digest = hasher::digest_string(&listing_text);

            if depth > 0 {
                if let Some(parent) = dir_path.parent() {
                    pending
                        .entry(parent.to_path_buf())
                        .or_default()
                        .push(TreeEntry::new(mode, EntryKind::Tree, digest.to_hex(), name.clone()));
                }
            }
            records.insert(
                dir_path.clone(),
                HashRecord {
                    path: dir_path,
                    digest,
                    kind: EntryKind::Tree,
                    name,
                    permission_bits: mode,
                    listing_text: Some(listing_text),
                },
            );
        }

        let root_digest = records.get(&root).map(|r| r.digest).ok_or_else(|| {
            StorageError::InvalidPath(format!("root not hashed: {}", root.display()))
        })?;

        info!(
            record_count = records.len(),
            root = %root_digest,
            duration_ms = start.elapsed().as_millis(),
            "Folder hash completed"
        );

        Ok(FolderHash {
            root: root_digest,
            records,
        })
    }

    /// Convenience wrapper returning only the root digest
    pub fn compute_root(&self) -> Result<Digest, StorageError> {
        Ok(self.build()?.root)
    }
}

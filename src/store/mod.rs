//! Object Store
//!
//! Content-addressed blob storage for file bytes and tree listings. An object's
//! location is derived from its digest, so every distinct blob is stored once no
//! matter how many artefact versions reference it.

pub mod objects;
pub mod restore;

pub use objects::FsObjectStore;
pub use restore::restore_tree;

use crate::error::StorageError;
use crate::tree::node::{EntryKind, HashRecord};
use crate::types::Digest;
use std::path::Path;

/// Object store interface
///
/// `put_*` return `true` when a blob was written and `false` when an object with that
/// digest already existed.
pub trait ObjectStore {
    fn has(&self, digest: &Digest) -> Result<bool, StorageError>;
    fn put_tree_blob(&self, digest: &Digest, listing_text: &str) -> Result<bool, StorageError>;
    fn put_file_blob(&self, digest: &Digest, source: &Path) -> Result<bool, StorageError>;

    /// Read an object back, decompressed
    fn read_object(&self, digest: &Digest) -> Result<Vec<u8>, StorageError>;

    /// Store the blob behind a hash record
    fn put_record(&self, record: &HashRecord) -> Result<bool, StorageError> {
        match (record.kind, &record.listing_text) {
            (EntryKind::Tree, Some(text)) => self.put_tree_blob(&record.digest, text),
            (EntryKind::Tree, None) => Err(StorageError::InvalidPath(format!(
                "tree record without listing: {}",
                record.path.display()
            ))),
            (EntryKind::File, _) => self.put_file_blob(&record.digest, &record.path),
        }
    }
}

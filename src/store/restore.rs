//! Rebuild a stored artefact folder from its root digest

use crate::error::StorageError;
use crate::store::ObjectStore;
use crate::tree::listing::TreeListing;
use crate::tree::node::EntryKind;
use crate::types::Digest;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Write the tree identified by `root` into `dest`, returning the number of files restored
///
/// Files and directories get back the permission bits recorded in their listings.
/// Directory permissions are applied after the directory's children are written so a
/// read-only directory can still be populated.
pub fn restore_tree<S: ObjectStore + ?Sized>(
    store: &S,
    root: &Digest,
    dest: &Path,
) -> Result<usize, StorageError> {
    fs::create_dir_all(dest)?;
    let restored = restore_children(store, root, dest)?;
    info!(root = %root, dest = %dest.display(), files = restored, "Restored artefact");
    Ok(restored)
}

fn restore_children<S: ObjectStore + ?Sized>(
    store: &S,
    tree: &Digest,
    dir: &Path,
) -> Result<usize, StorageError> {
    let text = String::from_utf8(store.read_object(tree)?).map_err(|_| {
        StorageError::InvalidPath(format!("tree object {} is not UTF-8", tree))
    })?;
    let listing = TreeListing::parse(&text)?;
    let mut restored = 0;

    for entry in listing.entries() {
        if entry.name.contains('/') || entry.name == ".." || entry.name == "." {
            return Err(StorageError::InvalidPath(format!(
                "refusing to restore entry named {:?}",
                entry.name
            )));
        }
        let digest: Digest = entry.digest.parse()?;
        let target = dir.join(&entry.name);

        match entry.kind {
            EntryKind::Tree => {
                fs::create_dir_all(&target)?;
                restored += restore_children(store, &digest, &target)?;
                set_mode(&target, entry.mode)?;
            }
            EntryKind::File => {
                fs::write(&target, store.read_object(&digest)?)?;
                set_mode(&target, entry.mode)?;
                debug!(path = %target.display(), "Restored file");
                restored += 1;
            }
        }
    }
    Ok(restored)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), StorageError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<(), StorageError> {
    Ok(())
}

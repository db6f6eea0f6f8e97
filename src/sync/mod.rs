//! Dependency Sync Planner
//!
//! Decides whether a dataset's raw dependency files need to be transferred by comparing
//! one combined digest of those files with the digest recorded at the destination.

pub mod extract;
pub mod progress;
pub mod remote;

pub use extract::{refresh_extract_cache, ExtractOutcome};
pub use progress::TransferProgress;
pub use remote::{DirRemote, RemoteStore};

use crate::error::{ApiError, StorageError};
use crate::tree::hasher::{digest_file, digest_string};
use crate::types::Digest;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Combined digest of a dataset's declared dependency files
///
/// Each `base_dir/raw/<file>` is hashed in sorted name order and the concatenated hex
/// digests are hashed again, so declaration order does not matter. A missing file fails
/// the whole computation.
pub fn compute_dependency_digest(files: &[String], base_dir: &Path) -> Result<Digest, StorageError> {
    let raw_dir = base_dir.join("raw");
    let mut sorted: Vec<&String> = files.iter().collect();
    sorted.sort();

    let mut concatenated = String::with_capacity(sorted.len() * crate::types::DIGEST_HEX_LEN);
    for file in sorted {
        let digest = digest_file(&raw_dir.join(file))?;
        concatenated.push_str(&digest.to_hex());
    }
    Ok(digest_string(&concatenated))
}

/// Transfer unless the remote holds exactly the local digest
pub fn should_transfer(remote: Option<&Digest>, local: &Digest) -> bool {
    remote != Some(local)
}

/// What an export did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    UpToDate { digest: Digest },
    Transferred { digest: Digest, files: usize, bytes: u64 },
}

/// Upload a dataset's dependencies when the remote marker differs from the local digest
///
/// Every declared file is uploaded before the marker is overwritten, so an interrupted
/// export is retried in full next time. `observer` sees each file's progress after every
/// chunk.
#[instrument(skip(remote, files, observer), fields(files = files.len()))]
pub fn export_dependencies<R: RemoteStore + ?Sized>(
    remote: &R,
    dataset: &str,
    data_dir: &Path,
    files: &[String],
    hash_marker: &str,
    observer: &dyn Fn(&TransferProgress),
) -> Result<SyncOutcome, ApiError> {
    let start = Instant::now();
    let local = compute_dependency_digest(files, data_dir)?;
    let marker_key = remote::marker_key(dataset, hash_marker);

    let recorded = remote
        .get_text(&marker_key)?
        .and_then(|text| match text.trim().parse::<Digest>() {
            Ok(digest) => Some(digest),
            Err(_) => {
                warn!(key = %marker_key, "Ignoring unparseable remote hash marker");
                None
            }
        });

    if !should_transfer(recorded.as_ref(), &local) {
        debug!(digest = %local, "Remote dependencies up to date");
        return Ok(SyncOutcome::UpToDate { digest: local });
    }

    let mut bytes = 0u64;
    for file in files {
        let path = data_dir.join("raw").join(file);
        let total = std::fs::metadata(&path)
            .map_err(|e| StorageError::from_read(&path, e))?
            .len();
        let progress = TransferProgress::new(&path, total);
        bytes += remote.upload_file(&path, &remote::dependency_key(dataset, file), &mut |n| {
            progress.update(n);
            observer(&progress);
        })?;
    }
    remote.put_text(&marker_key, &local.to_hex())?;

    info!(
        digest = %local,
        bytes,
        duration_ms = start.elapsed().as_millis(),
        "Dependencies exported"
    );
    Ok(SyncOutcome::Transferred {
        digest: local,
        files: files.len(),
        bytes,
    })
}

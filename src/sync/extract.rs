//! Local extraction cache for dataset dependencies
//!
//! Declared files are copied into `raw/<extract_dir>` for training to read, and
//! declared `.tar.gz` archives are unpacked there. The dependency digest of the last
//! refresh is kept in `raw/<hash_marker>` so unchanged dependencies are not touched.

use super::compute_dependency_digest;
use crate::config::HashingConfig;
use crate::error::StorageError;
use crate::types::Digest;
use flate2::read::GzDecoder;
use std::fs;
use std::io::BufReader;
use std::path::Path;
use tar::Archive;
use tracing::{debug, info};

/// Result of a cache refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// Cache and marker already matched the dependencies
    Fresh(Digest),
    /// Files were copied and the marker rewritten
    Refreshed(Digest),
}

impl ExtractOutcome {
    pub fn digest(&self) -> Digest {
        match self {
            ExtractOutcome::Fresh(d) | ExtractOutcome::Refreshed(d) => *d,
        }
    }
}

/// Bring `data_dir/raw/<extract_dir>` up to date with the declared dependency files
pub fn refresh_extract_cache(
    data_dir: &Path,
    files: &[String],
    hashing: &HashingConfig,
) -> Result<ExtractOutcome, StorageError> {
    let raw_dir = data_dir.join("raw");
    let extract_dir = raw_dir.join(&hashing.extract_dir);
    let marker = raw_dir.join(&hashing.hash_marker);

    let digest = compute_dependency_digest(files, data_dir)?;

    let recorded = match fs::read_to_string(&marker) {
        Ok(text) => text.trim().parse::<Digest>().ok(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(StorageError::from_read(&marker, e)),
    };

    if extract_dir.is_dir() && recorded == Some(digest) {
        debug!(dataset = %data_dir.display(), "Extraction cache is current");
        return Ok(ExtractOutcome::Fresh(digest));
    }

    // A half-built cache must never match a marker
    if marker.exists() {
        fs::remove_file(&marker)?;
    }
    if extract_dir.exists() {
        fs::remove_dir_all(&extract_dir)?;
    }
    fs::create_dir_all(&extract_dir)?;

    for file in files {
        let source = raw_dir.join(file);
        if is_archive(file) {
            unpack_archive(&source, &extract_dir)?;
        } else {
            let target = extract_dir.join(file);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&source, &target).map_err(|e| StorageError::from_read(&source, e))?;
        }
    }
    fs::write(&marker, digest.to_hex())?;

    info!(
        dataset = %data_dir.display(),
        files = files.len(),
        digest = %digest,
        "Extraction cache refreshed"
    );
    Ok(ExtractOutcome::Refreshed(digest))
}

fn is_archive(file: &str) -> bool {
    file.ends_with(".tar.gz") || file.ends_with(".tgz")
}

/// Unpack a gzipped tarball into `extract_dir`
///
/// An archive with files at its top level is unpacked as is. An archive holding a
/// single top directory has that directory's contents placed directly in `extract_dir`.
fn unpack_archive(source: &Path, extract_dir: &Path) -> Result<(), StorageError> {
    // Staged inside the cache so a failed unpack is never hashed with the dataset
    let staging = extract_dir.join(".unpack");
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }
    fs::create_dir_all(&staging)?;

    let file = fs::File::open(source).map_err(|e| StorageError::from_read(source, e))?;
    let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));
    archive
        .unpack(&staging)
        .map_err(|e| StorageError::from_read(source, e))?;

    let top: Vec<_> = fs::read_dir(&staging)?.collect::<Result<_, _>>()?;
    let content_root = match top.as_slice() {
        [single] if single.file_type()?.is_dir() => {
            debug!(
                archive = %source.display(),
                top = ?single.file_name(),
                "Stripping archive top directory"
            );
            single.path()
        }
        _ => staging.clone(),
    };

    for entry in fs::read_dir(&content_root)? {
        let entry = entry?;
        let target = extract_dir.join(entry.file_name());
        if target.is_dir() {
            fs::remove_dir_all(&target)?;
        } else if target.exists() {
            fs::remove_file(&target)?;
        }
        fs::rename(entry.path(), &target)?;
    }
    fs::remove_dir_all(&staging)?;
    Ok(())
}

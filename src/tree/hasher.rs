//! Content digests using SHA-256

use crate::error::StorageError;
use crate::types::Digest;
use sha2::{Digest as _, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Files are streamed through the hasher in chunks of this size.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Compute the digest of a file's bytes
///
/// The file is read in `CHUNK_SIZE` chunks so memory stays bounded regardless of size.
/// A missing file is reported as `MissingFile`; any other read failure as `UnreadableFile`.
pub fn digest_file(path: &Path) -> Result<Digest, StorageError> {
    let mut file = File::open(path).map_err(|e| StorageError::from_read(path, e))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(StorageError::from_read(path, e)),
        };
        hasher.update(&buf[..n]);
    }

    Ok(Digest::from_bytes(hasher.finalize().into()))
}

/// Compute the digest of a string's UTF-8 encoding
pub fn digest_string(text: &str) -> Digest {
    digest_bytes(text.as_bytes())
}

/// Compute the digest of raw bytes
pub fn digest_bytes(data: &[u8]) -> Digest {
    Digest::from_bytes(Sha256::digest(data).into())
}

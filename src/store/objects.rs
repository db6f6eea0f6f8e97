//! Filesystem object store
//!
//! Objects live at `{objects}/{hex[0..2]}/{hex[2..]}` and hold zlib-compressed bytes.

use crate::error::StorageError;
use crate::store::ObjectStore;
use crate::types::Digest;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use sha2::{Digest as _, Sha256};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Content-addressed object storage on the local filesystem
///
/// Sharding on the first two hex characters bounds directory fan-out. Writes go to a
/// temporary sibling and are renamed into place, so a crash mid-write never leaves a
/// truncated object at a valid address; re-running simply writes it again.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open (creating if needed) an object store rooted at `root`
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path of the object for `digest`
    pub fn object_path(&self, digest: &Digest) -> PathBuf {
        let (prefix, rest) = digest.shard();
        self.root.join(prefix).join(rest)
    }

    /// Compress everything from `reader` into the object for `digest`
    ///
    /// Returns the digest of the uncompressed bytes actually written.
    fn write_object<R: Read>(&self, digest: &Digest, reader: R) -> Result<Digest, StorageError> {
        let object_path = self.object_path(digest);
        let shard_dir = object_path
            .parent()
            .ok_or_else(|| StorageError::InvalidPath(object_path.display().to_string()))?;
        fs::create_dir_all(shard_dir)?;

        let temp_path = object_path.with_extension(format!("{}.tmp", std::process::id()));
        let result = (|| -> Result<Digest, StorageError> {
            let mut hashing = HashingReader::new(reader);
            let mut encoder = ZlibEncoder::new(File::create(&temp_path)?, Compression::default());
            io::copy(&mut hashing, &mut encoder)?;
            encoder.finish()?.sync_all()?;
            Ok(hashing.finish())
        })();

        let written = match result {
            Ok(written) => written,
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                return Err(e);
            }
        };

        if written != *digest {
            let _ = fs::remove_file(&temp_path);
            return Err(StorageError::HashMismatch {
                expected: *digest,
                actual: written,
            });
        }

        fs::rename(&temp_path, &object_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StorageError::IoError(e)
        })?;
        trace!(object = %object_path.display(), "Stored object");
        Ok(written)
    }
}

impl ObjectStore for FsObjectStore {
    fn has(&self, digest: &Digest) -> Result<bool, StorageError> {
        Ok(self.object_path(digest).is_file())
    }

    fn put_tree_blob(&self, digest: &Digest, listing_text: &str) -> Result<bool, StorageError> {
        if self.has(digest)? {
            debug!(digest = %digest, "Tree object already stored");
            return Ok(false);
        }
        self.write_object(digest, listing_text.as_bytes())?;
        Ok(true)
    }

    fn put_file_blob(&self, digest: &Digest, source: &Path) -> Result<bool, StorageError> {
        if self.has(digest)? {
            debug!(digest = %digest, "File object already stored");
            return Ok(false);
        }
        let file = File::open(source).map_err(|e| StorageError::from_read(source, e))?;
        self.write_object(digest, file)?;
        Ok(true)
    }

    fn read_object(&self, digest: &Digest) -> Result<Vec<u8>, StorageError> {
        let object_path = self.object_path(digest);
        let file = match File::open(&object_path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::ObjectNotFound(*digest))
            }
            Err(e) => return Err(StorageError::from_read(&object_path, e)),
        };

        let mut bytes = Vec::new();
        ZlibDecoder::new(file)
            .read_to_end(&mut bytes)
            .map_err(|e| StorageError::from_read(&object_path, e))?;

        let actual = Digest::from_bytes(Sha256::digest(&bytes).into());
        if actual != *digest {
            return Err(StorageError::HashMismatch {
                expected: *digest,
                actual,
            });
        }
        Ok(bytes)
    }
}

/// Reader adapter hashing bytes as they stream past
struct HashingReader<R> {
    inner: R,
    hasher: Sha256,
}

impl<R: Read> HashingReader<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    fn finish(self) -> Digest {
        Digest::from_bytes(self.hasher.finalize().into())
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }
}

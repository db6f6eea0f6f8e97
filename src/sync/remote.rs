//! Remote storage for dataset dependencies
//!
//! Keys mirror the project layout: dependency files at `data/<dataset>/raw/<file>` and the
//! last uploaded dependency digest at `data/<dataset>/raw/hash`.

use crate::error::{ApiError, StorageError};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use tracing::trace;

const COPY_CHUNK: usize = 64 * 1024;

/// Key of a declared dependency file
pub fn dependency_key(dataset: &str, file: &str) -> String {
    format!("data/{}/raw/{}", dataset, file)
}

/// Key of the dataset's dependency digest marker
pub fn marker_key(dataset: &str, hash_marker: &str) -> String {
    format!("data/{}/raw/{}", dataset, hash_marker)
}

/// Minimal object-storage interface the sync planner drives
pub trait RemoteStore {
    /// Text stored at `key`, or `None` when nothing is stored there
    fn get_text(&self, key: &str) -> Result<Option<String>, ApiError>;

    /// Store `text` at `key`, replacing any previous value
    fn put_text(&self, key: &str, text: &str) -> Result<(), ApiError>;

    /// Upload `local` to `key`, reporting each chunk's size to `progress`
    ///
    /// Returns the number of bytes uploaded.
    fn upload_file(
        &self,
        local: &Path,
        key: &str,
        progress: &mut dyn FnMut(u64),
    ) -> Result<u64, ApiError>;
}

/// Remote backed by a local (or mounted) directory
#[derive(Debug, Clone)]
pub struct DirRemote {
    root: PathBuf,
}

impl DirRemote {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem location of `key`; keys may not escape the root
    pub fn key_path(&self, key: &str) -> Result<PathBuf, ApiError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(ApiError::RemoteError(format!("invalid key: {:?}", key)));
        }
        Ok(self.root.join(relative))
    }

    fn prepare_parent(&self, path: &Path) -> Result<(), ApiError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| remote_io(path, e))?;
        }
        Ok(())
    }
}

fn remote_io(path: &Path, err: io::Error) -> ApiError {
    ApiError::RemoteError(format!("{}: {}", path.display(), err))
}

impl RemoteStore for DirRemote {
    fn get_text(&self, key: &str) -> Result<Option<String>, ApiError> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(remote_io(&path, e)),
        }
    }

    fn put_text(&self, key: &str, text: &str) -> Result<(), ApiError> {
        let path = self.key_path(key)?;
        self.prepare_parent(&path)?;
        fs::write(&path, text).map_err(|e| remote_io(&path, e))
    }

    fn upload_file(
        &self,
        local: &Path,
        key: &str,
        progress: &mut dyn FnMut(u64),
    ) -> Result<u64, ApiError> {
        let target = self.key_path(key)?;
        self.prepare_parent(&target)?;

        let mut source = File::open(local).map_err(|e| StorageError::from_read(local, e))?;
        let temp = target.with_extension(format!("{}.part", std::process::id()));
        let mut sink = File::create(&temp).map_err(|e| remote_io(&temp, e))?;

        let mut buf = vec![0u8; COPY_CHUNK];
        let mut total = 0u64;
        loop {
            let n = match source.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    let _ = fs::remove_file(&temp);
                    return Err(StorageError::from_read(local, e).into());
                }
            };
            if let Err(e) = sink.write_all(&buf[..n]) {
                let _ = fs::remove_file(&temp);
                return Err(remote_io(&temp, e));
            }
            total += n as u64;
            progress(n as u64);
        }

        sink.sync_all().map_err(|e| remote_io(&temp, e))?;
        fs::rename(&temp, &target).map_err(|e| {
            let _ = fs::remove_file(&temp);
            remote_io(&target, e)
        })?;
        trace!(key, bytes = total, "Uploaded file");
        Ok(total)
    }
}

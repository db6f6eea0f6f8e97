//! Error types for the mantra artefact versioning system.

use crate::types::{ArtefactKind, Digest};
use std::path::PathBuf;
use thiserror::Error;

/// Hashing, object store and ledger errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File does not exist: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed ledger line {line:?}: {reason}")]
    MalformedLedger { line: String, reason: String },

    #[error("Invalid digest: {0:?}")]
    InvalidDigest(String),

    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: Digest, actual: Digest },

    #[error("Invalid label: {0:?}")]
    InvalidLabel(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(Digest),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StorageError {
    /// Classify an I/O failure on `path`: not-found becomes `MissingFile`, anything else
    /// `UnreadableFile`.
    pub fn from_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            StorageError::MissingFile(path)
        } else {
            StorageError::UnreadableFile { path, source }
        }
    }
}

/// Errors surfaced to the training/cloud drivers and the CLI
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Dataset is not registered in the project configuration: {0}")]
    UnknownDataset(String),

    #[error("{kind} artefact {name:?} not found at {}", path.display())]
    ArtefactNotFound {
        kind: ArtefactKind,
        name: String,
        path: PathBuf,
    },

    #[error("Remote storage error: {0}")]
    RemoteError(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

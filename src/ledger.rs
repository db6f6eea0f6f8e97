//! Artefact Ledger
//!
//! Append-only logs recording when each artefact version was first seen. One file per
//! artefact kind (`MODELS`, `DATA`, `TASKS`) under the `.mantra` directory, one line
//! per event: `<digest> <unix-timestamp> <name> <description>`.

use crate::error::StorageError;
use crate::types::{ArtefactKind, Digest};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// One versioning event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub digest: Digest,
    pub timestamp: i64,
    /// Primary artefact name; a single whitespace-free token
    pub name: String,
    /// Free text; may contain spaces but not newlines
    pub description: String,
}

impl LedgerEntry {
    pub fn new(digest: Digest, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            digest,
            timestamp: chrono::Utc::now().timestamp(),
            name: name.into(),
            description: description.into(),
        }
    }

    /// Check the entry fits the fixed field layout
    pub fn validate(&self) -> Result<(), StorageError> {
        validate_token(&self.name)?;
        if self.description.contains(|c: char| c == '\n' || c == '\r') {
            return Err(StorageError::InvalidLabel(self.description.clone()));
        }
        Ok(())
    }

    /// The newline-terminated ledger line
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {} {}\n",
            self.digest, self.timestamp, self.name, self.description
        )
    }
}

impl FromStr for LedgerEntry {
    type Err = StorageError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| StorageError::MalformedLedger {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let mut fields = line.splitn(4, ' ');
        let (digest, timestamp, name, description) =
            match (fields.next(), fields.next(), fields.next(), fields.next()) {
                (Some(d), Some(t), Some(n), Some(desc)) => (d, t, n, desc),
                _ => return Err(malformed("expected 4 fields")),
            };

        Ok(Self {
            digest: digest.parse().map_err(|_| malformed("bad digest"))?,
            timestamp: timestamp.parse().map_err(|_| malformed("bad timestamp"))?,
            name: name.to_string(),
            description: description.to_string(),
        })
    }
}

/// Reject names that would break a space-separated record
pub(crate) fn validate_token(token: &str) -> Result<(), StorageError> {
    if token.is_empty() || token.chars().any(char::is_whitespace) {
        return Err(StorageError::InvalidLabel(token.to_string()));
    }
    Ok(())
}

/// Per-kind append-only ledger files
#[derive(Debug, Clone)]
pub struct ArtefactLedger {
    dir: PathBuf,
}

impl ArtefactLedger {
    /// Ledger files live directly inside `dir` (the `.mantra` directory)
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self, kind: ArtefactKind) -> PathBuf {
        self.dir.join(kind.ledger_name())
    }

    /// Append one entry; earlier lines are never touched
    pub fn append(&self, kind: ArtefactKind, entry: &LedgerEntry) -> Result<(), StorageError> {
        entry.validate()?;
        fs::create_dir_all(&self.dir)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(kind))?;
        file.write_all(entry.to_line().as_bytes())?;
        debug!(kind = %kind, digest = %entry.digest, name = %entry.name, "Ledger entry appended");
        Ok(())
    }

    /// Every entry for `kind` in append order; a missing ledger reads as empty
    pub fn entries(&self, kind: ArtefactKind) -> Result<Vec<LedgerEntry>, StorageError> {
        let text = match fs::read_to_string(self.path(kind)) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::from_read(self.path(kind), e)),
        };
        text.lines()
            .filter(|line| !line.is_empty())
            .map(LedgerEntry::from_str)
            .collect()
    }

    pub fn contains(&self, kind: ArtefactKind, digest: &Digest) -> Result<bool, StorageError> {
        Ok(self.entries(kind)?.iter().any(|e| e.digest == *digest))
    }
}

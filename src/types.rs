//! Core value types shared across the versioning system.

use crate::error::StorageError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Length of a digest rendered as hex.
pub const DIGEST_HEX_LEN: usize = 64;

/// Characters of the hex digest used as the object shard directory.
pub const SHARD_PREFIX_LEN: usize = 2;

/// A SHA-256 content digest.
///
/// Rendered canonically as 64 lowercase hex characters; that string form is what appears
/// in tree listings, ledgers, the trial log and remote hash markers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest([u8; 32]);

impl Digest {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Split the hex form into the shard directory and the object file name.
    pub fn shard(&self) -> (String, String) {
        let hex = self.to_hex();
        let (prefix, rest) = hex.split_at(SHARD_PREFIX_LEN);
        (prefix.to_string(), rest.to_string())
    }

    /// First `len` hex characters, for folder names and display.
    pub fn short(&self, len: usize) -> String {
        let mut hex = self.to_hex();
        hex.truncate(len.min(DIGEST_HEX_LEN));
        hex
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short(12))
    }
}

impl FromStr for Digest {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != DIGEST_HEX_LEN {
            return Err(StorageError::InvalidDigest(s.to_string()));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|_| StorageError::InvalidDigest(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The three kinds of versioned artefact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtefactKind {
    Model,
    Data,
    Task,
}

impl ArtefactKind {
    pub const ALL: [ArtefactKind; 3] = [ArtefactKind::Model, ArtefactKind::Data, ArtefactKind::Task];

    /// Ledger file under the `.mantra` directory.
    pub fn ledger_name(self) -> &'static str {
        match self {
            ArtefactKind::Model => "MODELS",
            ArtefactKind::Data => "DATA",
            ArtefactKind::Task => "TASKS",
        }
    }

    /// Project folder holding artefacts of this kind.
    pub fn folder_name(self) -> &'static str {
        match self {
            ArtefactKind::Model => "models",
            ArtefactKind::Data => "data",
            ArtefactKind::Task => "tasks",
        }
    }
}

impl fmt::Display for ArtefactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtefactKind::Model => "model",
            ArtefactKind::Data => "data",
            ArtefactKind::Task => "task",
        };
        f.write_str(name)
    }
}

impl FromStr for ArtefactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "model" | "models" => Ok(ArtefactKind::Model),
            "data" | "dataset" => Ok(ArtefactKind::Data),
            "task" | "tasks" => Ok(ArtefactKind::Task),
            other => Err(format!(
                "unknown artefact kind '{}' (expected model, data or task)",
                other
            )),
        }
    }
}

//! Hash records for files and trees in a folder's Merkle tree

use crate::types::Digest;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Whether an entry is a file blob or a tree (directory listing)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Tree,
    File,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Tree => "tree",
            EntryKind::File => "file",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tree" => Ok(EntryKind::Tree),
            "file" => Ok(EntryKind::File),
            other => Err(format!("unknown entry kind '{}'", other)),
        }
    }
}

/// One entry in the Merkle tree of a folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashRecord {
    /// Absolute filesystem path
    pub path: PathBuf,
    /// Digest of the file bytes, or of `listing_text` for a tree
    pub digest: Digest,
    pub kind: EntryKind,
    /// Base name within the parent directory
    pub name: String,
    /// `st_mode & 0o7777`, written in decimal in tree listings
    pub permission_bits: u32,
    /// Serialized child listing; present for trees only
    pub listing_text: Option<String>,
}

impl HashRecord {
    pub fn is_tree(&self) -> bool {
        self.kind == EntryKind::Tree
    }
}

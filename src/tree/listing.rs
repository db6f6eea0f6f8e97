//! Canonical text serialization of a directory's immediate children
//!
//! Each child becomes one line `<mode> <kind> <digest> <name> ` followed by a newline.
//! The mode is the decimal permission integer and every line keeps a trailing space
//! before the newline, matching listings already stored in existing `.mantra` object
//! stores. Subdirectories are listed before files, each group sorted by name, so the
//! listing is independent of filesystem enumeration order.

use crate::error::StorageError;
use crate::tree::node::EntryKind;

/// One child of a directory as it appears in a tree listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: u32,
    pub kind: EntryKind,
    /// Hex digest text of the child (its own file or tree digest)
    pub digest: String,
    pub name: String,
}

impl TreeEntry {
    pub fn new(mode: u32, kind: EntryKind, digest: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            mode,
            kind,
            digest: digest.into(),
            name: name.into(),
        }
    }
}

/// The direct children of one directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeListing {
    entries: Vec<TreeEntry>,
}

impl TreeListing {
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.name.cmp(&b.name)));
        Self { entries }
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the listing text whose digest identifies the directory
    pub fn render(&self) -> String {
        let mut text = String::new();
        for entry in &self.entries {
            text.push_str(&format!(
                "{} {} {} {} \n",
                entry.mode, entry.kind, entry.digest, entry.name
            ));
        }
        text
    }

    /// Parse listing text back into entries (used when restoring stored trees)
    pub fn parse(text: &str) -> Result<Self, StorageError> {
        let mut entries = Vec::new();
        for line in text.lines() {
            if line.is_empty() {
                continue;
            }
            let malformed = |reason: &str| StorageError::InvalidPath(format!(
                "malformed tree listing line {:?}: {}",
                line, reason
            ));

            let mut fields = line.splitn(4, ' ');
            let mode = fields
                .next()
                .and_then(|m| m.parse::<u32>().ok())
                .ok_or_else(|| malformed("bad mode"))?;
            let kind = fields
                .next()
                .and_then(|k| k.parse::<EntryKind>().ok())
                .ok_or_else(|| malformed("bad kind"))?;
            let digest = fields.next().ok_or_else(|| malformed("missing digest"))?;
            let name = fields
                .next()
                .and_then(|n| n.strip_suffix(' '))
                .filter(|n| !n.is_empty())
                .ok_or_else(|| malformed("missing name"))?;

            entries.push(TreeEntry::new(mode, kind, digest, name));
        }
        Ok(Self::new(entries))
    }
}

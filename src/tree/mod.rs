//! Folder Merkle Tree
//!
//! Hashes an artefact folder Git-style: every file gets a content digest, every
//! directory a digest of its serialized child listing, and the folder itself is
//! identified by the digest of its root listing.

pub mod builder;
pub mod hasher;
pub mod listing;
pub mod node;
pub mod path;
pub mod walker;

pub use builder::{FolderHash, TreeBuilder};
pub use node::{EntryKind, HashRecord};

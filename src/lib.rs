//! Mantra: Content-Addressed Artefact Versioning
//!
//! Versions the model, dataset and task folders of a machine-learning project. Each
//! folder is hashed into a Git-style Merkle tree, its blobs are kept in a deduplicated
//! object store under `.mantra/objects`, first sightings are recorded in append-only
//! ledgers, and trials are identified by hashes of the artefacts they use.

pub mod cli;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod project;
pub mod store;
pub mod sync;
pub mod trial;
pub mod tree;
pub mod types;
pub mod vault;

pub use error::{ApiError, StorageError};
pub use project::{Dataset, Project};
pub use types::{ArtefactKind, Digest};

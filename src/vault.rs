//! Artefact Vault
//!
//! Versioning of whole artefact folders: hash the folder, copy every blob into the
//! object store and record first sightings in the per-kind ledger.

use crate::error::{ApiError, StorageError};
use crate::ledger::{ArtefactLedger, LedgerEntry};
use crate::store::{FsObjectStore, ObjectStore};
use crate::trial::TrialSpec;
use crate::tree::walker::WalkerConfig;
use crate::tree::{FolderHash, TreeBuilder};
use crate::types::{ArtefactKind, Digest};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Outcome of versioning one artefact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionedArtefact {
    pub kind: ArtefactKind,
    pub name: String,
    pub digest: Digest,
    /// False when this exact version was already stored
    pub is_new: bool,
}

/// Outcome of versioning a trial's artefacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionedTrial {
    pub model: VersionedArtefact,
    pub data: VersionedArtefact,
    pub task: Option<VersionedArtefact>,
}

/// Object store plus ledger for one project
pub struct ArtefactVault {
    project_root: PathBuf,
    store: FsObjectStore,
    ledger: ArtefactLedger,
    walker_config: WalkerConfig,
}

impl ArtefactVault {
    /// Open the vault whose state lives in `mantra_dir`, versioning folders under `project_root`
    pub fn open(
        project_root: impl Into<PathBuf>,
        mantra_dir: &Path,
        walker_config: WalkerConfig,
    ) -> Result<Self, StorageError> {
        Ok(Self {
            project_root: project_root.into(),
            store: FsObjectStore::new(mantra_dir.join("objects"))?,
            ledger: ArtefactLedger::new(mantra_dir),
            walker_config,
        })
    }

    pub fn store(&self) -> &FsObjectStore {
        &self.store
    }

    pub fn ledger(&self) -> &ArtefactLedger {
        &self.ledger
    }

    /// `<project>/<models|data|tasks>/<name>`
    pub fn artefact_dir(&self, kind: ArtefactKind, name: &str) -> PathBuf {
        self.project_root.join(kind.folder_name()).join(name)
    }

    /// Store every blob of `folder` and append a ledger entry
    ///
    /// Returns `false` without writing anything when the root object is already stored.
    /// Children are written before the root object, so a stored root always has every
    /// blob it references.
    #[instrument(skip(self, folder), fields(root = %folder.root))]
    pub fn save_artefact(
        &self,
        folder: &FolderHash,
        kind: ArtefactKind,
        label: &str,
        description: &str,
    ) -> Result<bool, StorageError> {
        if self.store.has(&folder.root)? {
            debug!("Artefact version already stored");
            return Ok(false);
        }

        let entry = LedgerEntry::new(folder.root, label, description);
        entry.validate()?;

        let start = Instant::now();
        let mut written = 0usize;
        for record in folder.records.values().filter(|r| r.digest != folder.root) {
            if self.store.put_record(record)? {
                written += 1;
            }
        }
        match folder
            .records
            .values()
            .find(|r| r.is_tree() && r.digest == folder.root)
        {
            Some(root_record) => {
                self.store.put_record(root_record)?;
            }
            None => {
                self.store.put_tree_blob(&folder.root, "")?;
            }
        }
        written += 1;

        self.ledger.append(kind, &entry)?;
        info!(
            kind = %kind,
            label,
            objects_written = written,
            duration_ms = start.elapsed().as_millis(),
            "Artefact version saved"
        );
        Ok(true)
    }

    /// Hash and save the artefact folder `name` of `kind`
    pub fn version_artefact(
        &self,
        kind: ArtefactKind,
        name: &str,
        description: &str,
    ) -> Result<VersionedArtefact, ApiError> {
        let dir = self.artefact_dir(kind, name);
        if !dir.is_dir() {
            return Err(ApiError::ArtefactNotFound {
                kind,
                name: name.to_string(),
                path: dir,
            });
        }

        let folder = TreeBuilder::new(dir)
            .with_walker_config(self.walker_config.clone())
            .build()?;
        let is_new = self.save_artefact(&folder, kind, name, description)?;
        Ok(VersionedArtefact {
            kind,
            name: name.to_string(),
            digest: folder.root,
            is_new,
        })
    }

    /// Version the model, data and (if any) task of a trial
    pub fn version_artefacts(&self, spec: &TrialSpec) -> Result<VersionedTrial, ApiError> {
        let model = self.version_artefact(
            ArtefactKind::Model,
            &spec.model,
            &format!("trained on {}", spec.data),
        )?;
        let data = self.version_artefact(
            ArtefactKind::Data,
            &spec.data,
            &format!("used with model {}", spec.model),
        )?;
        let task = spec
            .task
            .as_deref()
            .map(|task| {
                self.version_artefact(
                    ArtefactKind::Task,
                    task,
                    &format!("used with model {} trained on {}", spec.model, spec.data),
                )
            })
            .transpose()?;

        Ok(VersionedTrial { model, data, task })
    }
}

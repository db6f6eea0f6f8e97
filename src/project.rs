//! Project
//!
//! A mantra project: `models/`, `data/`, `tasks/` and `trials/` folders plus the hidden
//! `.mantra` state directory, with the configuration loaded once for the process.

use crate::config::{ConfigLoader, MantraConfig, PROJECT_CONFIG_FILE};
use crate::error::{ApiError, StorageError};
use crate::sync::{self, DirRemote, ExtractOutcome, SyncOutcome, TransferProgress};
use crate::trial::{TrialLog, TrialMetadata, TrialRecord, TrialSpec};
use crate::types::{ArtefactKind, Digest};
use crate::vault::{ArtefactVault, VersionedTrial};
use serde::Serialize;
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Folder holding one sub-folder per trial
pub const TRIALS_DIR: &str = "trials";

/// What `Project::init` created
#[derive(Debug, Clone, Default, Serialize)]
pub struct InitReport {
    pub created: Vec<PathBuf>,
    /// Path of the newly written `mantra.toml`, if one was written
    pub config: Option<PathBuf>,
}

/// An opened project
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    config: MantraConfig,
}

/// Everything recorded when a trial is launched
#[derive(Debug, Clone, Serialize)]
pub struct LaunchedTrial {
    pub artefacts: VersionedTrial,
    pub record: TrialRecord,
    pub metadata_path: PathBuf,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, config: MantraConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Load and validate configuration for the project at `root`
    ///
    /// With `config_file`, only that file is layered over the defaults.
    pub fn open(root: &Path, config_file: Option<&Path>) -> Result<Self, ApiError> {
        let root = crate::tree::path::absolute_path(root)?;
        let config = match config_file {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&root)?,
        };
        config.validate().map_err(|errors| {
            ApiError::ConfigError(
                errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })?;

        let root = match &config.project_root {
            Some(configured) if configured.is_absolute() => configured.clone(),
            Some(configured) => root.join(configured),
            None => root,
        };
        Ok(Self::new(root, config))
    }

    /// Create the artefact folders and state directory, and a `mantra.toml` if none exists
    ///
    /// Existing folders and configuration are left untouched.
    pub fn init(&self) -> Result<InitReport, ApiError> {
        let mut report = InitReport::default();
        let dirs = [
            self.root.join(ArtefactKind::Model.folder_name()),
            self.root.join(ArtefactKind::Data.folder_name()),
            self.root.join(ArtefactKind::Task.folder_name()),
            self.root.join(TRIALS_DIR),
            self.config.storage.objects_dir(&self.root),
        ];
        for dir in dirs {
            if !dir.is_dir() {
                std::fs::create_dir_all(&dir).map_err(StorageError::from)?;
                report.created.push(dir);
            }
        }

        let config_path = self.root.join(PROJECT_CONFIG_FILE);
        if !config_path.exists() {
            let text = self
                .config
                .to_project_toml()
                .map_err(|e| ApiError::ConfigError(e.to_string()))?;
            std::fs::write(&config_path, text).map_err(StorageError::from)?;
            report.config = Some(config_path);
        }
        info!(created = report.created.len(), "Project initialized");
        Ok(report)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &MantraConfig {
        &self.config
    }

    pub fn mantra_dir(&self) -> PathBuf {
        self.config.storage.mantra_dir(&self.root)
    }

    pub fn artefact_dir(&self, kind: ArtefactKind, name: &str) -> PathBuf {
        self.root.join(kind.folder_name()).join(name)
    }

    pub fn trial_dir(&self, folder_name: &str) -> PathBuf {
        self.root.join(TRIALS_DIR).join(folder_name)
    }

    pub fn vault(&self) -> Result<ArtefactVault, StorageError> {
        ArtefactVault::open(
            &self.root,
            &self.mantra_dir(),
            self.config.hashing.walker_config(),
        )
    }

    pub fn trial_log(&self) -> TrialLog {
        TrialLog::new(self.mantra_dir())
    }

    /// A dataset registered under `[datasets.<name>]`
    pub fn dataset(&self, name: &str) -> Result<Dataset, ApiError> {
        let declared = self
            .config
            .datasets
            .get(name)
            .ok_or_else(|| ApiError::UnknownDataset(name.to_string()))?;
        Ok(Dataset::new(
            name,
            self.artefact_dir(ArtefactKind::Data, name),
            declared.files.clone(),
        ))
    }

    /// The configured directory remote
    pub fn remote(&self) -> Result<DirRemote, ApiError> {
        let root = self.config.remote.root.as_ref().ok_or_else(|| {
            ApiError::ConfigError("no remote configured; set [remote] root".to_string())
        })?;
        let root = if root.is_absolute() {
            root.clone()
        } else {
            self.root.join(root)
        };
        Ok(DirRemote::new(root))
    }

    /// Version a trial's artefacts, append it to the trial log and write its metadata
    pub fn launch_trial(
        &self,
        spec: &TrialSpec,
        hyperparameters: BTreeMap<String, serde_yaml::Value>,
        timestamp: i64,
    ) -> Result<LaunchedTrial, ApiError> {
        let artefacts = self.vault()?.version_artefacts(spec)?;
        let record = TrialRecord::new(
            spec,
            artefacts.model.digest,
            artefacts.data.digest,
            artefacts.task.as_ref().map(|t| t.digest),
            timestamp,
        );

        self.trial_log().append(&record)?;
        let metadata_path = TrialMetadata::new(&record, hyperparameters)
            .write_to(&self.trial_dir(&record.folder_name))?;

        info!(trial = %record.folder_name, trial_hash = %record.trial_hash, "Trial launched");
        Ok(LaunchedTrial {
            artefacts,
            record,
            metadata_path,
        })
    }
}

/// A registered dataset and its declared raw dependency files
#[derive(Debug)]
pub struct Dataset {
    name: String,
    dir: PathBuf,
    files: Vec<String>,
    dependency_digest: OnceCell<Digest>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>, files: Vec<String>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            files,
            dependency_digest: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Combined digest of the declared files, computed on first use
    pub fn dependency_digest(&self) -> Result<Digest, StorageError> {
        if let Some(digest) = self.dependency_digest.get() {
            return Ok(*digest);
        }
        let digest = sync::compute_dependency_digest(&self.files, &self.dir)?;
        Ok(*self.dependency_digest.get_or_init(|| digest))
    }

    pub fn refresh_extract_cache(
        &self,
        hashing: &crate::config::HashingConfig,
    ) -> Result<ExtractOutcome, StorageError> {
        sync::refresh_extract_cache(&self.dir, &self.files, hashing)
    }

    pub fn export<R: sync::RemoteStore + ?Sized>(
        &self,
        remote: &R,
        hash_marker: &str,
        observer: &dyn Fn(&TransferProgress),
    ) -> Result<SyncOutcome, ApiError> {
        sync::export_dependencies(remote, &self.name, &self.dir, &self.files, hash_marker, observer)
    }
}

//! Trials
//!
//! A trial is one training run over a model/data/task triple. Its identity is derived
//! from the three artefact digests plus the launch timestamp; the trial group drops the
//! timestamp so repeated runs of the same triple cluster together.

use crate::error::StorageError;
use crate::ledger::validate_token;
use crate::tree::hasher::digest_string;
use crate::types::Digest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Rendering of an absent task in hashes, records and metadata
pub const NO_TASK: &str = "none";

/// Hex characters of the trial hash used in trial folder names
pub const SHORT_HASH_LEN: usize = 6;

pub const DEFAULT_EPOCHS: i64 = 200;
pub const DEFAULT_BATCH_SIZE: i64 = 64;

/// Trial log file name inside the `.mantra` directory
pub const TRIALS_FILE: &str = "TRIALS";

/// Metadata file written into each trial folder
pub const METADATA_FILE: &str = "trial_metadata.yml";

/// Which artefacts a trial uses, by folder name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialSpec {
    pub model: String,
    pub data: String,
    pub task: Option<String>,
}

impl TrialSpec {
    pub fn new(model: impl Into<String>, data: impl Into<String>, task: Option<String>) -> Self {
        Self {
            model: model.into(),
            data: data.into(),
            task,
        }
    }
}

/// The two identities derived for a trial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialHashes {
    /// Unique per run
    pub trial_hash: Digest,
    /// Shared by every run of the same model/data/task triple
    pub trial_group_hash: Digest,
}

impl TrialHashes {
    /// Derive both hashes from the artefact digests and the unix launch timestamp
    pub fn derive(model: &Digest, data: &Digest, task: Option<&Digest>, timestamp: i64) -> Self {
        let task = task.map_or_else(|| NO_TASK.to_string(), Digest::to_hex);
        let group = format!("{}{}{}", model, data, task);
        Self {
            trial_group_hash: digest_string(&group),
            trial_hash: digest_string(&format!("{}{}", group, timestamp)),
        }
    }
}

/// One line of the trial log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub timestamp: i64,
    pub folder_name: String,
    pub trial_hash: Digest,
    pub trial_group_hash: Digest,
    pub model_name: String,
    pub model_hash: Digest,
    pub data_name: String,
    pub data_hash: Digest,
    /// `None` renders as `none` in both task columns
    pub task_name: Option<String>,
    pub task_hash: Option<Digest>,
}

impl TrialRecord {
    /// Assemble the record for a run launched at `timestamp`
    pub fn new(
        spec: &TrialSpec,
        model_hash: Digest,
        data_hash: Digest,
        task_hash: Option<Digest>,
        timestamp: i64,
    ) -> Self {
        let hashes = TrialHashes::derive(&model_hash, &data_hash, task_hash.as_ref(), timestamp);
        Self {
            timestamp,
            folder_name: folder_name(timestamp, &spec.model, &spec.data, &hashes.trial_hash),
            trial_hash: hashes.trial_hash,
            trial_group_hash: hashes.trial_group_hash,
            model_name: spec.model.clone(),
            model_hash,
            data_name: spec.data.clone(),
            data_hash,
            task_name: spec.task.clone(),
            task_hash,
        }
    }

    pub fn validate(&self) -> Result<(), StorageError> {
        validate_token(&self.model_name)?;
        validate_token(&self.data_name)?;
        if let Some(task) = &self.task_name {
            validate_token(task)?;
        }
        Ok(())
    }

    /// The ten-field, newline-terminated log line
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {} {} {} {} {} {} {} {}\n",
            self.timestamp,
            self.folder_name,
            self.trial_hash,
            self.trial_group_hash,
            self.model_name,
            self.model_hash,
            self.data_name,
            self.data_hash,
            self.task_name.as_deref().unwrap_or(NO_TASK),
            self.task_hash
                .map_or_else(|| NO_TASK.to_string(), |d| d.to_hex()),
        )
    }
}

impl FromStr for TrialRecord {
    type Err = StorageError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| StorageError::MalformedLedger {
            line: line.to_string(),
            reason: reason.to_string(),
        };
        let fields: Vec<&str> = line.split(' ').collect();
        if fields.len() != 10 {
            return Err(malformed("expected 10 fields"));
        }
        let digest = |field: &str| -> Result<Digest, StorageError> {
            field.parse().map_err(|_| malformed("bad digest"))
        };

        let (task_name, task_hash) = match (fields[8], fields[9]) {
            (NO_TASK, NO_TASK) => (None, None),
            (name, hash) => (Some(name.to_string()), Some(digest(hash)?)),
        };

        Ok(Self {
            timestamp: fields[0].parse().map_err(|_| malformed("bad timestamp"))?,
            folder_name: fields[1].to_string(),
            trial_hash: digest(fields[2])?,
            trial_group_hash: digest(fields[3])?,
            model_name: fields[4].to_string(),
            model_hash: digest(fields[5])?,
            data_name: fields[6].to_string(),
            data_hash: digest(fields[7])?,
            task_name,
            task_hash,
        })
    }
}

/// `{timestamp}_{model}_{data}_{first six hex of the trial hash}`
pub fn folder_name(timestamp: i64, model: &str, data: &str, trial_hash: &Digest) -> String {
    format!(
        "{}_{}_{}_{}",
        timestamp,
        model,
        data,
        trial_hash.short(SHORT_HASH_LEN)
    )
}

/// Append-only `.mantra/TRIALS` log
#[derive(Debug, Clone)]
pub struct TrialLog {
    path: PathBuf,
}

impl TrialLog {
    /// Log stored in the given `.mantra` directory
    pub fn new<P: AsRef<Path>>(mantra_dir: P) -> Self {
        Self {
            path: mantra_dir.as_ref().join(TRIALS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &TrialRecord) -> Result<(), StorageError> {
        record.validate()?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(record.to_line().as_bytes())?;
        debug!(trial = %record.folder_name, "Trial recorded");
        Ok(())
    }

    /// Every record in append order; a missing log reads as empty
    pub fn records(&self) -> Result<Vec<TrialRecord>, StorageError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::from_read(&self.path, e)),
        };
        text.lines()
            .filter(|line| !line.is_empty())
            .map(TrialRecord::from_str)
            .collect()
    }
}

/// Cluster records by trial group, keeping append order within each group
pub fn group_by_trial_group(records: &[TrialRecord]) -> BTreeMap<Digest, Vec<&TrialRecord>> {
    let mut groups: BTreeMap<Digest, Vec<&TrialRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.trial_group_hash).or_default().push(record);
    }
    groups
}

/// Contents of `trial_metadata.yml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialMetadata {
    pub model_name: String,
    pub data_name: String,
    pub model_hash: Digest,
    pub data_hash: Digest,
    pub task_name: String,
    pub task_hash: String,
    pub hyperparameters: BTreeMap<String, serde_yaml::Value>,
    pub timestamp: i64,
    pub trial_group_hash: Digest,
    pub trial_hash: Digest,
}

impl TrialMetadata {
    /// Metadata for `record`, with `epochs` and `batch_size` defaulted when not given
    pub fn new(record: &TrialRecord, mut hyperparameters: BTreeMap<String, serde_yaml::Value>) -> Self {
        hyperparameters
            .entry("epochs".to_string())
            .or_insert_with(|| DEFAULT_EPOCHS.into());
        hyperparameters
            .entry("batch_size".to_string())
            .or_insert_with(|| DEFAULT_BATCH_SIZE.into());

        Self {
            model_name: record.model_name.clone(),
            data_name: record.data_name.clone(),
            model_hash: record.model_hash,
            data_hash: record.data_hash,
            task_name: record.task_name.clone().unwrap_or_else(|| NO_TASK.to_string()),
            task_hash: record
                .task_hash
                .map_or_else(|| NO_TASK.to_string(), |d| d.to_hex()),
            hyperparameters,
            timestamp: record.timestamp,
            trial_group_hash: record.trial_group_hash,
            trial_hash: record.trial_hash,
        }
    }

    pub fn to_yaml(&self) -> Result<String, StorageError> {
        serde_yaml::to_string(self).map_err(|e| StorageError::InvalidPath(e.to_string()))
    }

    /// Write `trial_metadata.yml` into `trial_dir`, creating the directory
    pub fn write_to(&self, trial_dir: &Path) -> Result<PathBuf, StorageError> {
        fs::create_dir_all(trial_dir)?;
        let path = trial_dir.join(METADATA_FILE);
        fs::write(&path, self.to_yaml()?)?;
        Ok(path)
    }

    pub fn read_from(trial_dir: &Path) -> Result<Self, StorageError> {
        let path = trial_dir.join(METADATA_FILE);
        let text = fs::read_to_string(&path).map_err(|e| StorageError::from_read(&path, e))?;
        serde_yaml::from_str(&text).map_err(|e| StorageError::MalformedLedger {
            line: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Parse a `key=value` hyperparameter, typing the value as YAML would
pub fn parse_hyperparameter(pair: &str) -> Result<(String, serde_yaml::Value), String> {
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {:?}", pair))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty hyperparameter name in {:?}", pair));
    }
    let value = serde_yaml::from_str(value.trim())
        .unwrap_or_else(|_| serde_yaml::Value::String(value.trim().to_string()));
    Ok((key.to_string(), value))
}

//! Configuration System
//!
//! Project configuration built once at process start and passed by reference to the
//! components that need it. Layered from defaults, a user-level file, the project's
//! `mantra.toml`, an environment-specific file and `MANTRA__*` environment variables.

use crate::logging::LoggingConfig;
use crate::tree::walker::WalkerConfig;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path, PathBuf};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;
pub use sources::workspace_file::PROJECT_CONFIG_FILE;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MantraConfig {
    /// Project root (defaults to the directory the config was loaded for)
    #[serde(default)]
    pub project_root: Option<PathBuf>,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub hashing: HashingConfig,

    /// Registered datasets and their declared dependency files
    #[serde(default)]
    pub datasets: BTreeMap<String, DatasetConfig>,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where versioning state lives inside the project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Hidden state directory, relative to the project root
    #[serde(default = "default_mantra_dir")]
    pub mantra_dir: PathBuf,
}

fn default_mantra_dir() -> PathBuf {
    PathBuf::from(".mantra")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mantra_dir: default_mantra_dir(),
        }
    }
}

impl StorageConfig {
    /// Resolve the state directory against the project root
    pub fn mantra_dir(&self, project_root: &Path) -> PathBuf {
        if self.mantra_dir.is_absolute() {
            self.mantra_dir.clone()
        } else {
            project_root.join(&self.mantra_dir)
        }
    }

    pub fn objects_dir(&self, project_root: &Path) -> PathBuf {
        self.mantra_dir(project_root).join("objects")
    }
}

/// Reserved names excluded from folder hashes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashingConfig {
    /// Directory holding transient extracted data
    #[serde(default = "default_extract_dir")]
    pub extract_dir: String,

    /// File caching a previously computed dependency hash
    #[serde(default = "default_hash_marker")]
    pub hash_marker: String,
}

fn default_extract_dir() -> String {
    ".extract".to_string()
}

fn default_hash_marker() -> String {
    "hash".to_string()
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            extract_dir: default_extract_dir(),
            hash_marker: default_hash_marker(),
        }
    }
}

impl HashingConfig {
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig {
            excluded_dirs: vec![self.extract_dir.clone()],
            skipped_files: vec![self.hash_marker.clone()],
        }
    }
}

/// A dataset's declared raw dependency files, relative to its `raw/` directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default)]
    pub files: Vec<String>,
}

/// Directory-backed remote storage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub root: Option<PathBuf>,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Hashing(String),
    Storage(String),
    Dataset(String, String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Hashing(msg) => write!(f, "Hashing: {}", msg),
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
            ValidationError::Dataset(name, msg) => write!(f, "Dataset '{}': {}", name, msg),
        }
    }
}

impl std::error::Error for ValidationError {}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != ".."
}

impl DatasetConfig {
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for file in &self.files {
            let path = Path::new(file);
            if file.is_empty() {
                return Err("empty dependency file name".to_string());
            }
            if path.is_absolute()
                || path
                    .components()
                    .any(|c| matches!(c, Component::ParentDir | Component::RootDir))
            {
                return Err(format!("dependency '{}' must stay inside raw/", file));
            }
            if !seen.insert(file.as_str()) {
                return Err(format!("dependency '{}' declared twice", file));
            }
        }
        Ok(())
    }
}

/// Sections written to a fresh `mantra.toml`
#[derive(Serialize)]
struct StarterConfig<'a> {
    storage: &'a StorageConfig,
    hashing: &'a HashingConfig,
    datasets: &'a BTreeMap<String, DatasetConfig>,
}

impl MantraConfig {
    /// Render the storage, hashing and dataset sections as TOML
    pub fn to_project_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&StarterConfig {
            storage: &self.storage,
            hashing: &self.hashing,
            datasets: &self.datasets,
        })
    }

    /// Validate the entire configuration, collecting every problem
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !is_plain_name(&self.hashing.extract_dir) {
            errors.push(ValidationError::Hashing(format!(
                "extract_dir must be a single directory name, got '{}'",
                self.hashing.extract_dir
            )));
        }
        if !is_plain_name(&self.hashing.hash_marker) {
            errors.push(ValidationError::Hashing(format!(
                "hash_marker must be a single file name, got '{}'",
                self.hashing.hash_marker
            )));
        }
        if self.storage.mantra_dir.as_os_str().is_empty() {
            errors.push(ValidationError::Storage(
                "mantra_dir cannot be empty".to_string(),
            ));
        }
        for (name, dataset) in &self.datasets {
            if name.chars().any(char::is_whitespace) {
                errors.push(ValidationError::Dataset(
                    name.clone(),
                    "dataset names cannot contain whitespace".to_string(),
                ));
            }
            if let Err(e) = dataset.validate() {
                errors.push(ValidationError::Dataset(name.clone(), e));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

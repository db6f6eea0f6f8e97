//! Config loading facade: runs the source chain and produces a `MantraConfig`.

use super::merge::merge_policy;
use super::sources::{global_file, workspace_file};
use super::MantraConfig;
use config::{ConfigError, Environment, File};
use std::path::Path;
use tracing::debug;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the project at `project_root`
    ///
    /// Sources are applied lowest precedence first: built-in defaults, the user-level
    /// file, `mantra.toml`, `config/{MANTRA_ENV}.toml`, then `MANTRA__*` variables
    /// (for example `MANTRA__STORAGE__MANTRA_DIR`).
    pub fn load(project_root: &Path) -> Result<MantraConfig, ConfigError> {
        let mut builder = merge_policy::builder_with_defaults()?;
        builder = global_file::add_to_builder(builder)?;
        builder = workspace_file::add_to_builder(builder, project_root)?;
        builder = builder.add_source(Environment::with_prefix("MANTRA").separator("__"));

        let mut config: MantraConfig = builder.build()?.try_deserialize()?;
        if config.project_root.is_none() {
            config.project_root = Some(project_root.to_path_buf());
        }
        debug!(
            project_root = %project_root.display(),
            datasets = config.datasets.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Load configuration from a single explicit file on top of the defaults
    pub fn load_from_file(path: &Path) -> Result<MantraConfig, ConfigError> {
        let config = merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?;
        config.try_deserialize()
    }
}

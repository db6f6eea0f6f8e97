//! User-level config file source: `<config dir>/mantra/config.toml`

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::PathBuf;
use tracing::debug;

/// Path to the user-level config file.
///
/// `MANTRA_CONFIG_HOME` overrides the platform config directory.
pub fn global_config_path() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("MANTRA_CONFIG_HOME") {
        return Some(PathBuf::from(home).join("config.toml"));
    }
    directories::BaseDirs::new().map(|dirs| dirs.config_dir().join("mantra").join("config.toml"))
}

/// Add the user-level config file to the builder if it exists.
pub fn add_to_builder(
    mut builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if let Some(path) = global_config_path() {
        if path.is_file() {
            let canonical = dunce::canonicalize(&path).unwrap_or(path);
            builder = builder.add_source(File::from(canonical).required(false));
        } else {
            debug!(config_path = %path.display(), "No user-level configuration file");
        }
    }
    Ok(builder)
}

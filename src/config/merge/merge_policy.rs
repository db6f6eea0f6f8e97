//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("storage.mantra_dir", ".mantra")?
        .set_default("hashing.extract_dir", ".extract")?
        .set_default("hashing.hash_marker", "hash")
}

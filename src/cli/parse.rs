//! CLI parse: clap types for mantra. No behavior; definitions only.

use crate::trial::parse_hyperparameter;
use crate::types::{ArtefactKind, Digest};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Mantra CLI - content-addressed versioning of models, datasets and tasks
#[derive(Parser)]
#[command(name = "mantra")]
#[command(about = "Content-addressed versioning of models, datasets and tasks")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project root directory
    #[arg(long, default_value = ".", global = true)]
    pub project: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, both)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output includes a file)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the project folders, state directory and a default mantra.toml
    Init,
    /// Compute the Merkle hash of a folder
    Hash {
        /// Folder to hash
        folder: PathBuf,
        /// List every file and tree record
        #[arg(long)]
        records: bool,
    },
    /// Version a trial's artefacts and record the trial
    Version {
        /// Model folder name under models/
        #[arg(long)]
        model: String,
        /// Dataset folder name under data/
        #[arg(long)]
        data: String,
        /// Task folder name under tasks/
        #[arg(long)]
        task: Option<String>,
        /// Hyperparameter as key=value (repeatable)
        #[arg(long = "hp", value_parser = parse_hyperparameter)]
        hyperparameters: Vec<(String, serde_yaml::Value)>,
    },
    /// Show a dataset's dependency digest
    Deps {
        /// Registered dataset name
        dataset: String,
    },
    /// Refresh a dataset's local extraction cache
    Extract {
        /// Registered dataset name
        dataset: String,
    },
    /// Upload a dataset's dependencies to the remote if they changed
    Sync {
        /// Registered dataset name
        dataset: String,
    },
    /// Show the version ledger for an artefact kind
    Log {
        /// model, data or task
        kind: ArtefactKind,
    },
    /// Show recorded trials
    Trials {
        /// Group trials by model/data/task combination
        #[arg(long)]
        group: bool,
    },
    /// Rebuild a stored artefact version into a directory
    Restore {
        /// Root digest of the version
        digest: Digest,
        /// Destination directory
        dest: PathBuf,
    },
}

//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::help::command_name;
use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{
    format_dependency_digest, format_extract_outcome, format_hash_result, format_init_result,
    format_launched_trial, format_ledger, format_restore_result, format_sync_outcome,
    format_trials,
};
use crate::error::ApiError;
use crate::project::Project;
use crate::store::restore_tree;
use crate::sync::TransferProgress;
use crate::trial::TrialSpec;
use crate::tree::TreeBuilder;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Runtime context for CLI execution: the opened project and output format.
pub struct RunContext {
    project: Project,
    format: OutputFormat,
}

impl RunContext {
    /// Open the project at `project_root`. Uses ConfigLoader only.
    pub fn new(
        project_root: PathBuf,
        config_path: Option<PathBuf>,
        format: OutputFormat,
    ) -> Result<Self, ApiError> {
        let project = Project::open(&project_root, config_path.as_deref())?;
        Ok(Self { project, format })
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let name = command_name(command);
        debug!(command = name, "Command started");
        let result = self.execute_inner(command);
        info!(
            command = name,
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis(),
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        let format = self.format;
        match command {
            Commands::Init => {
                let report = self.project.init()?;
                format_init_result(&report.created, report.config.as_deref(), format)
            }
            Commands::Hash { folder, records } => {
                let folder = if folder.is_absolute() {
                    folder.clone()
                } else {
                    self.project.root().join(folder)
                };
                let hash = TreeBuilder::new(folder.clone())
                    .with_walker_config(self.project.config().hashing.walker_config())
                    .build()?;
                format_hash_result(&folder, &hash, *records, format)
            }
            Commands::Version {
                model,
                data,
                task,
                hyperparameters,
            } => {
                let spec = TrialSpec::new(model.clone(), data.clone(), task.clone());
                let hyperparameters: BTreeMap<_, _> = hyperparameters.iter().cloned().collect();
                let launched = self.project.launch_trial(
                    &spec,
                    hyperparameters,
                    chrono::Utc::now().timestamp(),
                )?;
                format_launched_trial(&launched, format)
            }
            Commands::Deps { dataset } => {
                let dataset = self.project.dataset(dataset)?;
                let digest = dataset.dependency_digest()?;
                format_dependency_digest(dataset.name(), dataset.files(), &digest, format)
            }
            Commands::Extract { dataset } => {
                let dataset = self.project.dataset(dataset)?;
                let outcome = dataset.refresh_extract_cache(&self.project.config().hashing)?;
                format_extract_outcome(dataset.name(), &outcome, format)
            }
            Commands::Sync { dataset } => {
                let dataset = self.project.dataset(dataset)?;
                let remote = self.project.remote()?;
                let show_progress = format == OutputFormat::Text;
                let outcome = dataset.export(
                    &remote,
                    &self.project.config().hashing.hash_marker,
                    &|progress: &TransferProgress| {
                        if show_progress {
                            print_progress(progress);
                        }
                    },
                )?;
                if show_progress {
                    eprintln!();
                }
                format_sync_outcome(dataset.name(), &outcome, format)
            }
            Commands::Log { kind } => {
                let entries = self.project.vault()?.ledger().entries(*kind)?;
                format_ledger(*kind, &entries, format)
            }
            Commands::Trials { group } => {
                let records = self.project.trial_log().records()?;
                format_trials(&records, *group, format)
            }
            Commands::Restore { digest, dest } => {
                let vault = self.project.vault()?;
                let files = restore_tree(vault.store(), digest, dest)?;
                format_restore_result(digest, dest, files, format)
            }
        }
    }
}

fn print_progress(progress: &TransferProgress) {
    let name = progress
        .path()
        .file_name()
        .map(Path::new)
        .unwrap_or_else(|| progress.path());
    let mut stderr = std::io::stderr().lock();
    let _ = write!(
        stderr,
        "\r Uploading {}  {} / {}  ({:.2}%)",
        name.display(),
        progress.transferred(),
        progress.total(),
        progress.percent()
    );
    let _ = stderr.flush();
}

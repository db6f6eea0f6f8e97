//! CLI help: stable command names for logs.

use crate::cli::parse::Commands;

/// Command name used in log events.
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init => "init",
        Commands::Hash { .. } => "hash",
        Commands::Version { .. } => "version",
        Commands::Deps { .. } => "deps",
        Commands::Extract { .. } => "extract",
        Commands::Sync { .. } => "sync",
        Commands::Log { .. } => "log",
        Commands::Trials { .. } => "trials",
        Commands::Restore { .. } => "restore",
    }
}

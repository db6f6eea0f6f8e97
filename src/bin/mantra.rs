//! Mantra CLI Binary
//!
//! Command-line interface for content-addressed artefact versioning.

use clap::Parser;
use mantra::cli::{Cli, RunContext};
use mantra::config::ConfigLoader;
use mantra::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);
    if let Err(e) = init_logging(Some(&logging_config), &cli.project) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Mantra CLI starting");

    let context = match RunContext::new(cli.project.clone(), cli.config.clone(), cli.format) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error opening project: {}", e);
            eprintln!("{}", mantra::cli::map_error(&e));
            process::exit(1);
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", mantra::cli::map_error(&e));
            process::exit(1);
        }
    }
}

/// Build logging configuration from CLI args and the config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let loaded = match cli.config {
        Some(ref config_path) => ConfigLoader::load_from_file(config_path),
        None => ConfigLoader::load(&cli.project),
    };
    let mut config = loaded.map(|c| c.logging).unwrap_or_default();

    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = file.clone();
    }
    config
}

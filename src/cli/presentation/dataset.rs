//! Dataset presentation: dependency digests, extraction and sync results.

use super::shared::{header, to_json};
use crate::cli::parse::OutputFormat;
use crate::error::ApiError;
use crate::sync::{ExtractOutcome, SyncOutcome};
use crate::types::Digest;
use owo_colors::OwoColorize;
use serde_json::json;

pub fn format_dependency_digest(
    dataset: &str,
    files: &[String],
    digest: &Digest,
    format: OutputFormat,
) -> Result<String, ApiError> {
    if format == OutputFormat::Json {
        return to_json(&json!({ "dataset": dataset, "files": files, "digest": digest }));
    }
    let mut sorted: Vec<&String> = files.iter().collect();
    sorted.sort();
    let mut lines = vec![format!("{} {}", dataset, digest)];
    lines.extend(sorted.into_iter().map(|f| format!("  raw/{}", f)));
    Ok(lines.join("\n"))
}

pub fn format_extract_outcome(
    dataset: &str,
    outcome: &ExtractOutcome,
    format: OutputFormat,
) -> Result<String, ApiError> {
    let (status, digest) = match outcome {
        ExtractOutcome::Fresh(d) => ("fresh", d),
        ExtractOutcome::Refreshed(d) => ("refreshed", d),
    };
    if format == OutputFormat::Json {
        return to_json(&json!({ "dataset": dataset, "status": status, "digest": digest }));
    }
    Ok(match outcome {
        ExtractOutcome::Fresh(_) => header(&format!("{} extraction cache is current", dataset)),
        ExtractOutcome::Refreshed(_) => header(&format!(
            "{} dependencies extracted ({})",
            dataset,
            digest.short(12)
        )),
    })
}

pub fn format_sync_outcome(
    dataset: &str,
    outcome: &SyncOutcome,
    format: OutputFormat,
) -> Result<String, ApiError> {
    if format == OutputFormat::Json {
        return to_json(outcome);
    }
    Ok(match outcome {
        SyncOutcome::UpToDate { digest } => header(&format!(
            "Remote {} already at {} {}",
            dataset,
            digest.short(12),
            "(skipped)".dimmed()
        )),
        SyncOutcome::Transferred {
            digest,
            files,
            bytes,
        } => header(&format!(
            "Uploaded {} files ({} bytes) for {}; remote hash now {}",
            files,
            bytes,
            dataset,
            digest.short(12).blue()
        )),
    })
}

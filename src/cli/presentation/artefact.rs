//! Artefact presentation: folder hashes, ledgers, restores and project init.

use super::shared::{format_timestamp, header, new_table, to_json};
use crate::cli::parse::OutputFormat;
use crate::error::ApiError;
use crate::ledger::LedgerEntry;
use crate::tree::FolderHash;
use crate::types::{ArtefactKind, Digest};
use serde_json::json;
use std::path::{Path, PathBuf};

pub fn format_hash_result(
    folder: &Path,
    hash: &FolderHash,
    show_records: bool,
    format: OutputFormat,
) -> Result<String, ApiError> {
    if format == OutputFormat::Json {
        let mut out = json!({
            "folder": folder,
            "root": hash.root,
            "files": hash.file_count(),
        });
        if show_records {
            out["records"] = hash
                .records
                .values()
                .map(|r| {
                    json!({
                        "path": r.path,
                        "kind": r.kind.as_str(),
                        "digest": r.digest,
                        "mode": r.permission_bits,
                    })
                })
                .collect();
        }
        return to_json(&out);
    }

    if !show_records {
        return Ok(hash.root.to_hex());
    }
    let mut table = new_table(vec!["Kind", "Mode", "Digest", "Path"]);
    for record in hash.records.values() {
        table.add_row(vec![
            record.kind.as_str().to_string(),
            format!("{:o}", record.permission_bits),
            record.digest.short(12),
            record.path.display().to_string(),
        ]);
    }
    Ok(format!("{}\n{}", hash.root, table))
}

pub fn format_ledger(
    kind: ArtefactKind,
    entries: &[LedgerEntry],
    format: OutputFormat,
) -> Result<String, ApiError> {
    if format == OutputFormat::Json {
        return to_json(entries);
    }
    if entries.is_empty() {
        return Ok(format!("No {} versions recorded.", kind));
    }
    let mut table = new_table(vec!["Digest", "Recorded", "Name", "Description"]);
    for entry in entries {
        table.add_row(vec![
            entry.digest.short(12),
            format_timestamp(entry.timestamp),
            entry.name.clone(),
            entry.description.clone(),
        ]);
    }
    Ok(table.to_string())
}

pub fn format_restore_result(
    digest: &Digest,
    dest: &Path,
    files: usize,
    format: OutputFormat,
) -> Result<String, ApiError> {
    if format == OutputFormat::Json {
        return to_json(&json!({ "root": digest, "dest": dest, "files": files }));
    }
    Ok(header(&format!(
        "Restored {} ({} files) into {}",
        digest.short(12),
        files,
        dest.display()
    )))
}

pub fn format_init_result(
    created: &[PathBuf],
    config_path: Option<&Path>,
    format: OutputFormat,
) -> Result<String, ApiError> {
    if format == OutputFormat::Json {
        return to_json(&json!({ "created": created, "config": config_path }));
    }
    let mut lines = vec![header("Project initialized")];
    lines.extend(created.iter().map(|p| format!("  created {}", p.display())));
    if let Some(path) = config_path {
        lines.push(format!("  wrote {}", path.display()));
    }
    Ok(lines.join("\n"))
}

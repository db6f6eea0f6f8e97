//! Trial presentation: versioning summaries and the trial log.

use super::shared::{format_timestamp, header, new_table, to_json};
use crate::cli::parse::OutputFormat;
use crate::error::ApiError;
use crate::project::LaunchedTrial;
use crate::trial::{group_by_trial_group, TrialRecord, NO_TASK};
use crate::vault::VersionedArtefact;
use owo_colors::OwoColorize;
use serde_json::json;

fn artefact_line(label: &str, artefact: &VersionedArtefact) -> String {
    let mut line = format!(
        " {} {}",
        "...".bold(),
        format!("{:<19}{}", format!("{} hash:", label), artefact.digest).blue()
    );
    if artefact.is_new {
        line.push_str(" (new)");
    }
    line
}

pub fn format_launched_trial(
    launched: &LaunchedTrial,
    format: OutputFormat,
) -> Result<String, ApiError> {
    if format == OutputFormat::Json {
        return to_json(launched);
    }
    let artefacts = &launched.artefacts;
    let mut lines = vec![
        header("Model, data and task artefacts versioned"),
        artefact_line("Model", &artefacts.model),
        artefact_line("Data", &artefacts.data),
    ];
    if let Some(task) = &artefacts.task {
        lines.push(artefact_line("Task", task));
    }
    lines.push(header(&format!(
        "Trial {} recorded",
        launched.record.folder_name
    )));
    lines.push(format!("     metadata: {}", launched.metadata_path.display()));
    Ok(lines.join("\n"))
}

pub fn format_trials(
    records: &[TrialRecord],
    group: bool,
    format: OutputFormat,
) -> Result<String, ApiError> {
    if group {
        let groups = group_by_trial_group(records);
        if format == OutputFormat::Json {
            let out: Vec<_> = groups
                .iter()
                .map(|(group_hash, trials)| {
                    json!({
                        "trial_group_hash": group_hash,
                        "model_name": trials[0].model_name,
                        "data_name": trials[0].data_name,
                        "task_name": trials[0].task_name,
                        "trials": trials.iter().map(|t| &t.folder_name).collect::<Vec<_>>(),
                    })
                })
                .collect();
            return to_json(&out);
        }
        let mut table = new_table(vec!["Group", "Model", "Data", "Task", "Trials", "Latest"]);
        for (group_hash, trials) in &groups {
            let first = trials[0];
            let latest = trials.iter().map(|t| t.timestamp).max().unwrap_or(first.timestamp);
            table.add_row(vec![
                group_hash.short(12),
                first.model_name.clone(),
                first.data_name.clone(),
                first.task_name.clone().unwrap_or_else(|| NO_TASK.to_string()),
                trials.len().to_string(),
                format_timestamp(latest),
            ]);
        }
        return Ok(table.to_string());
    }

    if format == OutputFormat::Json {
        return to_json(records);
    }
    if records.is_empty() {
        return Ok("No trials recorded.".to_string());
    }
    let mut table = new_table(vec!["Started", "Trial", "Model", "Data", "Task"]);
    for record in records {
        table.add_row(vec![
            format_timestamp(record.timestamp),
            record.folder_name.clone(),
            format!("{} {}", record.model_name, record.model_hash.short(6)),
            format!("{} {}", record.data_name, record.data_hash.short(6)),
            match (&record.task_name, &record.task_hash) {
                (Some(name), Some(hash)) => format!("{} {}", name, hash.short(6)),
                _ => NO_TASK.to_string(),
            },
        ]);
    }
    Ok(table.to_string())
}

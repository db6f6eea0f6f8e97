//! Integration tests for trial launches, the trial log and trial metadata

use mantra::config::MantraConfig;
use mantra::trial::{
    group_by_trial_group, TrialHashes, TrialMetadata, TrialRecord, TrialSpec, DEFAULT_BATCH_SIZE,
    NO_TASK,
};
use mantra::tree::hasher::digest_string;
use mantra::Project;
use std::collections::BTreeMap;
use std::fs;

use super::test_utils::sample_project;

#[test]
fn test_trial_hashes_follow_definition() {
    let m = digest_string("m");
    let d = digest_string("d");
    let t = digest_string("t");

    let with_task = TrialHashes::derive(&m, &d, Some(&t), 1_535_000_000);
    assert_eq!(
        with_task.trial_group_hash,
        digest_string(&format!("{}{}{}", m, d, t))
    );
    assert_eq!(
        with_task.trial_hash,
        digest_string(&format!("{}{}{}1535000000", m, d, t))
    );

    let without_task = TrialHashes::derive(&m, &d, None, 1_535_000_000);
    assert_eq!(
        without_task.trial_group_hash,
        digest_string(&format!("{}{}{}", m, d, NO_TASK))
    );
}

#[test]
fn test_repeated_launches_share_group() {
    let temp_dir = sample_project();
    let project = Project::new(temp_dir.path(), MantraConfig::default());
    let spec = TrialSpec::new("log_reg", "epl_data", Some("binary_crossent".to_string()));

    let first = project.launch_trial(&spec, BTreeMap::new(), 1_535_000_000).unwrap();
    let second = project.launch_trial(&spec, BTreeMap::new(), 1_535_000_060).unwrap();

    assert_eq!(first.record.trial_group_hash, second.record.trial_group_hash);
    assert_ne!(first.record.trial_hash, second.record.trial_hash);
    assert!(!second.artefacts.model.is_new);

    let records = project.trial_log().records().unwrap();
    assert_eq!(records.len(), 2);
    let groups = group_by_trial_group(&records);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups.values().next().unwrap().len(), 2);
}

#[test]
fn test_trial_log_line_layout() {
    let temp_dir = sample_project();
    let project = Project::new(temp_dir.path(), MantraConfig::default());
    let spec = TrialSpec::new("log_reg", "epl_data", None);

    let launched = project.launch_trial(&spec, BTreeMap::new(), 1_535_000_000).unwrap();
    let text = fs::read_to_string(project.mantra_dir().join("TRIALS")).unwrap();
    let fields: Vec<&str> = text.trim_end().split(' ').collect();

    assert_eq!(fields.len(), 10);
    assert_eq!(fields[0], "1535000000");
    assert_eq!(
        fields[1],
        format!(
            "1535000000_log_reg_epl_data_{}",
            launched.record.trial_hash.short(6)
        )
    );
    assert_eq!(fields[4], "log_reg");
    assert_eq!(fields[8], "none");
    assert_eq!(fields[9], "none");
    assert_eq!(text.trim_end().parse::<TrialRecord>().unwrap(), launched.record);
}

#[test]
fn test_metadata_defaults_and_overrides() {
    let temp_dir = sample_project();
    let project = Project::new(temp_dir.path(), MantraConfig::default());
    let spec = TrialSpec::new("log_reg", "epl_data", None);

    let mut hyperparameters = BTreeMap::new();
    hyperparameters.insert("epochs".to_string(), serde_yaml::Value::from(5));
    hyperparameters.insert("dropout".to_string(), serde_yaml::Value::from(0.25));
    let launched = project.launch_trial(&spec, hyperparameters, 1_535_000_000).unwrap();

    assert_eq!(
        launched.metadata_path,
        project
            .root()
            .join("trials")
            .join(&launched.record.folder_name)
            .join("trial_metadata.yml")
    );
    let metadata =
        TrialMetadata::read_from(&project.trial_dir(&launched.record.folder_name)).unwrap();
    assert_eq!(metadata.model_hash, launched.record.model_hash);
    assert_eq!(metadata.hyperparameters["epochs"], serde_yaml::Value::from(5));
    assert_eq!(
        metadata.hyperparameters["batch_size"],
        serde_yaml::Value::from(DEFAULT_BATCH_SIZE)
    );
}

#[test]
fn test_failed_launch_writes_nothing() {
    let temp_dir = sample_project();
    let project = Project::new(temp_dir.path(), MantraConfig::default());
    let spec = TrialSpec::new("log_reg", "missing_data", None);

    assert!(project.launch_trial(&spec, BTreeMap::new(), 1).is_err());
    assert!(project.trial_log().records().unwrap().is_empty());
    assert!(!project.root().join("trials").exists());
}

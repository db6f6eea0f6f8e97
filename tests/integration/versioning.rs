//! Integration tests for artefact versioning and the ledgers

use mantra::store::ObjectStore;
use mantra::trial::TrialSpec;
use mantra::tree::walker::WalkerConfig;
use mantra::tree::TreeBuilder;
use mantra::vault::ArtefactVault;
use mantra::{ApiError, ArtefactKind};
use std::fs;

use super::test_utils::sample_project;

fn open(root: &std::path::Path) -> ArtefactVault {
    ArtefactVault::open(root, &root.join(".mantra"), WalkerConfig::default()).unwrap()
}

#[test]
fn test_saving_twice_is_idempotent() {
    let project = sample_project();
    let vault = open(project.path());
    let folder = TreeBuilder::new(project.path().join("models/log_reg"))
        .build()
        .unwrap();

    assert!(vault
        .save_artefact(&folder, ArtefactKind::Model, "log_reg", "trained on epl_data")
        .unwrap());
    assert!(!vault
        .save_artefact(&folder, ArtefactKind::Model, "log_reg", "trained on epl_data")
        .unwrap());

    let ledger = fs::read_to_string(project.path().join(".mantra/MODELS")).unwrap();
    assert_eq!(ledger.lines().count(), 1);
    assert!(ledger.starts_with(&format!("{} ", folder.root)));
    assert!(ledger.ends_with(" log_reg trained on epl_data\n"));
}

#[test]
fn test_trial_descriptions_per_kind() {
    let project = sample_project();
    let vault = open(project.path());
    let spec = TrialSpec::new("log_reg", "epl_data", Some("binary_crossent".to_string()));

    let versioned = vault.version_artefacts(&spec).unwrap();
    assert!(versioned.model.is_new && versioned.data.is_new);
    assert!(versioned.task.as_ref().unwrap().is_new);

    let model = vault.ledger().entries(ArtefactKind::Model).unwrap();
    let data = vault.ledger().entries(ArtefactKind::Data).unwrap();
    let task = vault.ledger().entries(ArtefactKind::Task).unwrap();

    assert_eq!(model[0].description, "trained on epl_data");
    assert_eq!(data[0].description, "used with model log_reg");
    assert_eq!(task[0].description, "used with model log_reg trained on epl_data");
    assert_eq!(task[0].name, "binary_crossent");
    assert_eq!(task[0].digest, versioned.task.unwrap().digest);
}

#[test]
fn test_changed_artefact_gets_second_ledger_line() {
    let project = sample_project();
    let vault = open(project.path());
    let spec = TrialSpec::new("log_reg", "epl_data", None);

    let first = vault.version_artefacts(&spec).unwrap();
    fs::write(project.path().join("models/log_reg/model.py"), "class LR: pass\n").unwrap();
    let second = vault.version_artefacts(&spec).unwrap();

    assert!(second.model.is_new);
    assert!(!second.data.is_new);
    assert_ne!(first.model.digest, second.model.digest);
    assert_eq!(first.data.digest, second.data.digest);

    let models = vault.ledger().entries(ArtefactKind::Model).unwrap();
    assert_eq!(models.len(), 2);
    assert_eq!(vault.ledger().entries(ArtefactKind::Data).unwrap().len(), 1);
    assert!(vault
        .ledger()
        .contains(ArtefactKind::Model, &first.model.digest)
        .unwrap());
}

#[test]
fn test_reverting_does_not_add_a_line() {
    let project = sample_project();
    let vault = open(project.path());
    let model_py = project.path().join("models/log_reg/model.py");
    let original = fs::read_to_string(&model_py).unwrap();

    vault
        .version_artefact(ArtefactKind::Model, "log_reg", "trained on epl_data")
        .unwrap();
    fs::write(&model_py, "changed\n").unwrap();
    vault
        .version_artefact(ArtefactKind::Model, "log_reg", "trained on epl_data")
        .unwrap();
    fs::write(&model_py, original).unwrap();
    let reverted = vault
        .version_artefact(ArtefactKind::Model, "log_reg", "trained on epl_data")
        .unwrap();

    assert!(!reverted.is_new);
    assert_eq!(vault.ledger().entries(ArtefactKind::Model).unwrap().len(), 2);
}

#[test]
fn test_dataset_hash_marker_does_not_create_version() {
    let project = sample_project();
    let vault = open(project.path());
    let first = vault
        .version_artefact(ArtefactKind::Data, "epl_data", "used with model log_reg")
        .unwrap();

    fs::write(project.path().join("data/epl_data/raw/hash"), "anything").unwrap();
    fs::create_dir_all(project.path().join("data/epl_data/raw/.extract")).unwrap();
    fs::write(project.path().join("data/epl_data/raw/.extract/a.csv"), "1,2\n").unwrap();

    let second = vault
        .version_artefact(ArtefactKind::Data, "epl_data", "used with model log_reg")
        .unwrap();
    assert_eq!(first.digest, second.digest);
    assert!(!second.is_new);
}

#[test]
fn test_missing_artefact_folder() {
    let project = sample_project();
    let vault = open(project.path());
    let spec = TrialSpec::new("no_such_model", "epl_data", None);

    match vault.version_artefacts(&spec) {
        Err(ApiError::ArtefactNotFound { kind, name, .. }) => {
            assert_eq!(kind, ArtefactKind::Model);
            assert_eq!(name, "no_such_model");
        }
        other => panic!("expected ArtefactNotFound, got {:?}", other),
    }
    assert!(!project.path().join(".mantra/MODELS").exists());
}

#[test]
fn test_empty_artefact_folder_is_versioned() {
    let project = sample_project();
    fs::create_dir_all(project.path().join("tasks/empty")).unwrap();
    let vault = open(project.path());

    let versioned = vault
        .version_artefact(ArtefactKind::Task, "empty", "used with model a trained on b")
        .unwrap();
    assert_eq!(versioned.digest, mantra::tree::hasher::digest_string(""));
    assert!(versioned.is_new);
    assert_eq!(vault.store().read_object(&versioned.digest).unwrap(), b"");
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_writes_no_ledger_line_or_objects() {
    use mantra::StorageError;
    use std::os::unix::fs::PermissionsExt;

    let project = sample_project();
    let locked = project.path().join("models/log_reg/weights/locked.bin");
    fs::write(&locked, "secret").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read(&locked).is_ok() {
        // Permission bits do not bind a privileged user
        return;
    }

    let vault = open(project.path());
    let result = vault.version_artefact(ArtefactKind::Model, "log_reg", "trained on epl_data");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert!(matches!(
        result,
        Err(ApiError::StorageError(StorageError::UnreadableFile { .. }))
    ));
    assert!(!project.path().join(".mantra/MODELS").exists());
    let stored_objects = walkdir::WalkDir::new(project.path().join(".mantra/objects"))
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .count();
    assert_eq!(stored_objects, 0);
}

#[cfg(unix)]
#[test]
fn test_symlinked_artefact_folder_is_versioned() {
    let project = sample_project();
    let target = project.path().join("storage/big_model");
    fs::create_dir_all(&target).unwrap();
    fs::write(target.join("model.py"), "class Big: pass\n").unwrap();
    std::os::unix::fs::symlink(&target, project.path().join("models/big_model")).unwrap();

    let vault = open(project.path());
    let versioned = vault
        .version_artefact(ArtefactKind::Model, "big_model", "trained on epl_data")
        .unwrap();

    assert!(versioned.is_new);
    assert_eq!(
        versioned.digest,
        TreeBuilder::new(target).compute_root().unwrap()
    );
    assert_eq!(vault.ledger().entries(ArtefactKind::Model).unwrap().len(), 1);
}

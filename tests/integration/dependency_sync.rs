//! Integration tests for dependency digests, the extraction cache and remote export

use mantra::config::{DatasetConfig, MantraConfig, RemoteConfig};
use mantra::sync::{
    compute_dependency_digest, should_transfer, RemoteStore, SyncOutcome, TransferProgress,
};
use mantra::tree::hasher::{digest_file, digest_string};
use mantra::{ApiError, Project, StorageError};
use std::cell::RefCell;
use std::fs;
use tempfile::TempDir;

use super::test_utils::sample_project;

fn project(root: &std::path::Path, remote: Option<&std::path::Path>) -> Project {
    let mut config = MantraConfig::default();
    config.datasets.insert(
        "epl_data".to_string(),
        DatasetConfig {
            files: vec!["a.csv".to_string(), "b.csv".to_string()],
        },
    );
    config.remote = RemoteConfig {
        root: remote.map(|p| p.to_path_buf()),
    };
    Project::new(root, config)
}

#[test]
fn test_dependency_digest_end_to_end() {
    let temp_dir = sample_project();
    let data_dir = temp_dir.path().join("data/epl_data");
    let files = vec!["a.csv".to_string(), "b.csv".to_string()];

    let a = digest_string("1,2\n");
    let b = digest_string("3,4\n");
    assert_eq!(digest_file(&data_dir.join("raw/a.csv")).unwrap(), a);

    let expected = digest_string(&format!("{}{}", a.to_hex(), b.to_hex()));
    assert_eq!(compute_dependency_digest(&files, &data_dir).unwrap(), expected);
}

#[test]
fn test_dependency_digest_ignores_declaration_order() {
    let temp_dir = sample_project();
    let data_dir = temp_dir.path().join("data/epl_data");

    let forward = vec!["a.csv".to_string(), "b.csv".to_string()];
    let backward = vec!["b.csv".to_string(), "a.csv".to_string()];
    let forward = compute_dependency_digest(&forward, &data_dir).unwrap();
    let backward = compute_dependency_digest(&backward, &data_dir).unwrap();
    assert_eq!(forward, backward);
}

#[test]
fn test_dependency_digest_of_no_files() {
    let temp_dir = TempDir::new().unwrap();
    let none: Vec<String> = Vec::new();
    assert_eq!(
        compute_dependency_digest(&none, temp_dir.path()).unwrap(),
        digest_string("")
    );
}

#[test]
fn test_dependency_digest_missing_file_names_path() {
    let temp_dir = sample_project();
    let data_dir = temp_dir.path().join("data/epl_data");

    let files = vec!["a.csv".to_string(), "gone.csv".to_string()];
    match compute_dependency_digest(&files, &data_dir) {
        Err(StorageError::MissingFile(path)) => {
            assert_eq!(path, data_dir.join("raw/gone.csv"));
        }
        other => panic!("expected MissingFile, got {:?}", other),
    }
}

#[test]
fn test_should_transfer_decision_table() {
    let local = digest_string("local");
    let other = digest_string("other");
    assert!(should_transfer(None, &local));
    assert!(should_transfer(Some(&other), &local));
    assert!(!should_transfer(Some(&local), &local));
}

#[test]
fn test_export_through_project() {
    let temp_dir = sample_project();
    let remote_dir = TempDir::new().unwrap();
    let project = project(temp_dir.path(), Some(remote_dir.path()));
    let dataset = project.dataset("epl_data").unwrap();
    let remote = project.remote().unwrap();

    let seen = RefCell::new(Vec::new());
    let observer = |progress: &TransferProgress| {
        seen.borrow_mut()
            .push((progress.path().to_path_buf(), progress.percent()));
    };

    let outcome = dataset.export(&remote, "hash", &observer).unwrap();
    let digest = dataset.dependency_digest().unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Transferred {
            digest,
            files: 2,
            bytes: 8
        }
    );
    assert_eq!(
        remote.get_text("data/epl_data/raw/hash").unwrap(),
        Some(digest.to_hex())
    );
    assert_eq!(
        fs::read_to_string(remote_dir.path().join("data/epl_data/raw/b.csv")).unwrap(),
        "3,4\n"
    );
    assert!(seen.borrow().iter().any(|(_, pct)| (*pct - 100.0).abs() < f64::EPSILON));

    seen.borrow_mut().clear();
    let again = dataset.export(&remote, "hash", &observer).unwrap();
    assert_eq!(again, SyncOutcome::UpToDate { digest });
    assert!(seen.borrow().is_empty());
}

#[test]
fn test_remote_not_configured() {
    let temp_dir = sample_project();
    let project = project(temp_dir.path(), None);
    assert!(matches!(project.remote(), Err(ApiError::ConfigError(_))));
}

#[test]
fn test_extract_cache_through_project() {
    let temp_dir = sample_project();
    let project = project(temp_dir.path(), None);
    let dataset = project.dataset("epl_data").unwrap();
    let hashing = project.config().hashing.clone();

    let first = dataset.refresh_extract_cache(&hashing).unwrap();
    assert!(matches!(first, mantra::sync::ExtractOutcome::Refreshed(_)));
    assert_eq!(first.digest(), dataset.dependency_digest().unwrap());
    assert!(dataset.dir().join("raw/.extract/a.csv").is_file());

    let second = dataset.refresh_extract_cache(&hashing).unwrap();
    assert!(matches!(second, mantra::sync::ExtractOutcome::Fresh(_)));

    // The cache never changes the dataset's version
    let vault = project.vault().unwrap();
    let versioned = vault
        .version_artefact(mantra::ArtefactKind::Data, "epl_data", "used with model log_reg")
        .unwrap();
    fs::remove_dir_all(dataset.dir().join("raw/.extract")).unwrap();
    fs::remove_file(dataset.dir().join("raw/hash")).unwrap();
    let again = vault
        .version_artefact(mantra::ArtefactKind::Data, "epl_data", "used with model log_reg")
        .unwrap();
    assert_eq!(versioned.digest, again.digest);
}

//! Integration tests for the object store: saving whole folders and restoring them

use mantra::store::{restore_tree, FsObjectStore, ObjectStore};
use mantra::tree::walker::WalkerConfig;
use mantra::tree::TreeBuilder;
use mantra::vault::ArtefactVault;
use mantra::ArtefactKind;
use std::fs;
use tempfile::TempDir;

use super::test_utils::{sample_project, write_file};

#[test]
fn test_every_record_is_stored_under_its_shard() {
    let project = sample_project();
    let root = project.path();
    let vault = ArtefactVault::open(root, &root.join(".mantra"), WalkerConfig::default()).unwrap();

    let folder = TreeBuilder::new(root.join("models/log_reg")).build().unwrap();
    assert!(vault
        .save_artefact(&folder, ArtefactKind::Model, "log_reg", "trained on epl_data")
        .unwrap());

    for record in folder.records.values() {
        let hex = record.digest.to_hex();
        let expected = root
            .join(".mantra/objects")
            .join(&hex[..2])
            .join(&hex[2..]);
        assert!(expected.is_file(), "missing object for {}", record.path.display());
        assert_eq!(vault.store().object_path(&record.digest), expected);
    }
}

#[test]
fn test_restore_reproduces_folder() {
    let project = sample_project();
    let root = project.path();
    let vault = ArtefactVault::open(root, &root.join(".mantra"), WalkerConfig::default()).unwrap();
    let versioned = vault
        .version_artefact(ArtefactKind::Model, "log_reg", "trained on epl_data")
        .unwrap();

    let dest = TempDir::new().unwrap();
    let restored_dir = dest.path().join("log_reg");
    let files = restore_tree(vault.store(), &versioned.digest, &restored_dir).unwrap();

    assert_eq!(files, 2);
    assert_eq!(
        fs::read_to_string(restored_dir.join("weights/layer1.txt")).unwrap(),
        "0.5 0.25\n"
    );
    assert_eq!(
        TreeBuilder::new(restored_dir).compute_root().unwrap(),
        versioned.digest
    );
}

#[test]
fn test_identical_files_share_one_object() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "models/a/weights.txt", "same bytes\n");
    write_file(root, "models/b/weights.txt", "same bytes\n");
    write_file(root, "models/b/extra.txt", "different\n");

    let vault = ArtefactVault::open(root, &root.join(".mantra"), WalkerConfig::default()).unwrap();
    vault
        .version_artefact(ArtefactKind::Model, "a", "trained on x")
        .unwrap();
    vault
        .version_artefact(ArtefactKind::Model, "b", "trained on x")
        .unwrap();

    // a: 1 file + 1 tree; b: 1 new file + 1 tree (weights.txt is shared)
    let objects: usize = fs::read_dir(root.join(".mantra/objects"))
        .unwrap()
        .map(|shard| fs::read_dir(shard.unwrap().path()).unwrap().count())
        .sum();
    assert_eq!(objects, 4);
}

#[test]
fn test_corrupted_object_is_detected_on_read() {
    let temp_dir = TempDir::new().unwrap();
    let store = FsObjectStore::new(temp_dir.path().join("objects")).unwrap();
    let source = temp_dir.path().join("x.csv");
    fs::write(&source, "1,2\n").unwrap();
    let digest = mantra::tree::hasher::digest_file(&source).unwrap();
    store.put_file_blob(&digest, &source).unwrap();

    // Replace the object with a valid zlib stream of other bytes
    let other = temp_dir.path().join("other.csv");
    fs::write(&other, "9,9\n").unwrap();
    let other_digest = mantra::tree::hasher::digest_file(&other).unwrap();
    store.put_file_blob(&other_digest, &other).unwrap();
    fs::copy(store.object_path(&other_digest), store.object_path(&digest)).unwrap();

    assert!(matches!(
        store.read_object(&digest),
        Err(mantra::StorageError::HashMismatch { .. })
    ));
}

#[test]
fn test_restore_unknown_root_fails() {
    let temp_dir = TempDir::new().unwrap();
    let store = FsObjectStore::new(temp_dir.path().join("objects")).unwrap();
    let digest = mantra::tree::hasher::digest_string("never stored");

    assert!(matches!(
        restore_tree(&store, &digest, &temp_dir.path().join("out")),
        Err(mantra::StorageError::ObjectNotFound(_))
    ));
}

//! Hasher Implementation Verification Tests
//!
//! Digests must be plain SHA-256 rendered as lowercase hex so they interoperate with any
//! other SHA-256 implementation.

use mantra::tree::hasher;
use mantra::Digest;
use std::fs;
use tempfile::TempDir;

const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

#[test]
fn test_string_digest_matches_known_vectors() {
    assert_eq!(hasher::digest_string("").to_hex(), EMPTY_SHA256);
    assert_eq!(hasher::digest_string("abc").to_hex(), ABC_SHA256);
}

#[test]
fn test_file_digest_equals_string_digest_of_contents() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("abc.txt");
    fs::write(&file, "abc").unwrap();

    assert_eq!(hasher::digest_file(&file).unwrap().to_hex(), ABC_SHA256);
}

#[test]
fn test_large_file_spanning_chunks() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("large.bin");
    let contents: Vec<u8> = (0..hasher::CHUNK_SIZE * 3 + 17)
        .map(|i| (i % 251) as u8)
        .collect();
    fs::write(&file, &contents).unwrap();

    assert_eq!(
        hasher::digest_file(&file).unwrap(),
        hasher::digest_bytes(&contents)
    );
}

#[test]
fn test_missing_file_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let result = hasher::digest_file(&temp_dir.path().join("nope.csv"));
    assert!(matches!(
        result,
        Err(mantra::StorageError::MissingFile(_))
    ));
}

#[test]
fn test_listing_digest_fixture() {
    let listing = "700 tree hash1 folder1 \n\
                   700 tree hash2 folder2 \n\
                   700 file hash4 file1 \n\
                   700 file hash5 file2 \n\
                   700 file hash6 file3 \n";
    assert_eq!(
        hasher::digest_string(listing).to_hex(),
        "b258eeaf5c932c3b57a0e1f955f11331df5b66f6a1dfb470686397f6c3726c4c"
    );
}

#[test]
fn test_digest_hex_parses_back() {
    let digest: Digest = ABC_SHA256.parse().unwrap();
    assert_eq!(digest, hasher::digest_string("abc"));
    assert_eq!(digest.short(6), "ba7816");
    assert!("ABC".parse::<Digest>().is_err());
}

//! Tests for the floor stores

use super::*;
use crate::error::Error;
use chrono::NaiveDate;
use tempfile::tempdir;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

// ============================================================================
// FileFloorStore
// ============================================================================

#[tokio::test]
async fn test_file_store_absent_is_no_floor() {
    let dir = tempdir().unwrap();
    let store = FileFloorStore::new(dir.path());
    assert!(store.load_floor("alice").await.unwrap().is_none());
}

#[tokio::test]
async fn test_file_store_round_trip_per_user() {
    let dir = tempdir().unwrap();
    let store = FileFloorStore::new(dir.path().join("state"));

    store.save_floor("alice", d(2024, 1, 31)).await.unwrap();
    store.save_floor("bob", d(2023, 5, 1)).await.unwrap();

    assert_eq!(store.load_floor("alice").await.unwrap(), Some(d(2024, 1, 31)));
    assert_eq!(store.load_floor("bob").await.unwrap(), Some(d(2023, 5, 1)));

    let raw = std::fs::read_to_string(dir.path().join("state/alice.since")).unwrap();
    assert_eq!(raw, "2024-01-31");
    assert!(!dir.path().join("state/alice.tmp").exists());
}

#[tokio::test]
async fn test_file_store_overwrites() {
    let dir = tempdir().unwrap();
    let store = FileFloorStore::new(dir.path());

    store.save_floor("alice", d(2024, 1, 1)).await.unwrap();
    store.save_floor("alice", d(2024, 2, 1)).await.unwrap();

    assert_eq!(store.load_floor("alice").await.unwrap(), Some(d(2024, 2, 1)));
}

#[tokio::test]
async fn test_file_store_rejects_unsafe_user() {
    let dir = tempdir().unwrap();
    let store = FileFloorStore::new(dir.path());
    assert!(store.load_floor("../etc").await.is_err());
    assert!(store.save_floor("a/b", d(2024, 1, 1)).await.is_err());
}

#[test]
fn test_file_store_location() {
    let store = FileFloorStore::new("state");
    assert!(store.location("alice").ends_with("alice.since"));
}

// ============================================================================
// SinceFileStore
// ============================================================================

#[tokio::test]
async fn test_since_file_blank_is_no_floor() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("since.txt");
    std::fs::write(&path, "  \n").unwrap();

    let store = SinceFileStore::new(&path);
    assert!(store.load_floor("alice").await.unwrap().is_none());
}

#[tokio::test]
async fn test_since_file_trims_whitespace() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("since.txt");
    std::fs::write(&path, "2024-06-01\n").unwrap();

    let store = SinceFileStore::new(&path);
    assert_eq!(store.load_floor("anyone").await.unwrap(), Some(d(2024, 6, 1)));
}

#[tokio::test]
async fn test_since_file_malformed_is_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("since.txt");
    std::fs::write(&path, "last tuesday").unwrap();

    let store = SinceFileStore::new(&path);
    let err = store.load_floor("alice").await.unwrap_err();
    assert!(matches!(err, Error::State { .. }));
    assert!(err.to_string().contains("last tuesday"));
}

#[tokio::test]
async fn test_since_file_creates_parent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("deep/dir/since.txt");

    let store = SinceFileStore::new(&path);
    store.save_floor("alice", d(2020, 2, 29)).await.unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "2020-02-29");
    assert_eq!(store.path(), path.as_path());
}

#[tokio::test]
async fn test_since_file_is_shared_between_users() {
    let dir = tempdir().unwrap();
    let store = SinceFileStore::new(dir.path().join("since.txt"));
    store.save_floor("alice", d(2024, 3, 1)).await.unwrap();

    assert!(store.is_shared());
    assert_eq!(store.load_floor("bob").await.unwrap(), Some(d(2024, 3, 1)));
    assert_eq!(store.location("alice"), store.location("bob"));

    assert!(!FileFloorStore::new(dir.path()).is_shared());
    assert!(!MemoryFloorStore::new().is_shared());
}

// ============================================================================
// MemoryFloorStore
// ============================================================================

#[tokio::test]
async fn test_memory_store() {
    let store = MemoryFloorStore::with_floor("alice", d(2024, 1, 1));
    assert_eq!(store.load_floor("alice").await.unwrap(), Some(d(2024, 1, 1)));
    assert!(store.load_floor("bob").await.unwrap().is_none());

    let shared = store.clone();
    shared.save_floor("bob", d(2024, 3, 3)).await.unwrap();
    assert_eq!(store.load_floor("bob").await.unwrap(), Some(d(2024, 3, 3)));
    assert_eq!(store.location("bob"), "memory:bob");
}

#[tokio::test]
async fn test_store_as_trait_object() {
    let dir = tempdir().unwrap();
    let stores: Vec<Box<dyn FloorStore>> = vec![
        Box::new(FileFloorStore::new(dir.path())),
        Box::new(SinceFileStore::new(dir.path().join("since.txt"))),
        Box::new(MemoryFloorStore::new()),
    ];

    for store in stores {
        store.save_floor("carol", d(2021, 12, 1)).await.unwrap();
        assert_eq!(
            store.load_floor("carol").await.unwrap(),
            Some(d(2021, 12, 1))
        );
    }
}

//! Tests for WAL Recovery
//!
//! These tests verify:
//! - Replay applies records in file order
//! - Last writer wins, deletes remove
//! - Replay is deterministic across independent stores
//! - Decode errors abort replay without rollback
//! - Verification without applying

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use localkv::wal::{WalRecovery, WalWriter};
use localkv::{KvError, Store};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

fn write_scenario(path: &Path) {
    let mut writer = WalWriter::open(path).unwrap();
    writer.append_put("x", "1").unwrap();
    writer.append_put("y", "2").unwrap();
    writer.append_put("x", "3").unwrap();
    writer.append_delete("y").unwrap();
    writer.append_put("z", "4").unwrap();
    writer.append_delete("missing").unwrap();
}

// =============================================================================
// Replay Tests
// =============================================================================

#[test]
fn test_replay_applies_in_order() {
    let (_temp, wal_path) = setup_temp_wal();
    write_scenario(&wal_path);

    let store = Store::new();
    let result = WalRecovery::replay(&wal_path, &store).unwrap();

    assert_eq!(result.puts, 4);
    assert_eq!(result.deletes, 2);
    assert_eq!(result.records(), 6);
    assert_eq!(store.get("x"), Some("3".to_string()));
    assert_eq!(store.get("y"), None);
    assert_eq!(store.get("z"), Some("4".to_string()));
    assert_eq!(store.keys(), vec!["x", "z"]);
}

#[test]
fn test_replay_on_top_of_existing_state() {
    let (_temp, wal_path) = setup_temp_wal();
    write_scenario(&wal_path);

    let store = Store::new();
    store.put("y".to_string(), "from-snapshot".to_string());
    store.put("w".to_string(), "untouched".to_string());

    WalRecovery::replay(&wal_path, &store).unwrap();

    assert_eq!(store.get("w"), Some("untouched".to_string()));
    assert_eq!(store.get("y"), None);
}

#[test]
fn test_replay_twice_into_fresh_stores_is_identical() {
    let (_temp, wal_path) = setup_temp_wal();
    write_scenario(&wal_path);

    let first = Store::new();
    let second = Store::new();
    WalRecovery::replay(&wal_path, &first).unwrap();
    WalRecovery::replay(&wal_path, &second).unwrap();

    assert_eq!(first.snapshot(), second.snapshot());
    assert_eq!(first.keys(), second.keys());
}

#[test]
fn test_replay_empty_wal() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::write(&wal_path, "").unwrap();

    let store = Store::new();
    let result = WalRecovery::replay(&wal_path, &store).unwrap();

    assert_eq!(result.records(), 0);
    assert!(store.is_empty());
}

#[test]
fn test_replay_missing_file_is_io_error() {
    let (_temp, wal_path) = setup_temp_wal();

    let result = WalRecovery::replay(&wal_path, &Store::new());

    assert!(matches!(result, Err(KvError::Io(_))));
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_malformed_record_aborts_without_rollback() {
    let (_temp, wal_path) = setup_temp_wal();
    {
        let mut writer = WalWriter::open(&wal_path).unwrap();
        writer.append_put("before", "1").unwrap();
    }
    {
        let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
        file.write_all(b"{\"op\":\"PUT\",\"key\":\"torn\"\n").unwrap();
        file.write_all(b"{\"op\":\"PUT\",\"key\":\"after\",\"value\":\"2\"}\n")
            .unwrap();
    }

    let store = Store::new();
    let err = WalRecovery::replay(&wal_path, &store).unwrap_err();

    assert!(matches!(err, KvError::WalDecode { line: 2, .. }));
    // Applied before the bad line: kept. After it: never applied.
    assert_eq!(store.get("before"), Some("1".to_string()));
    assert_eq!(store.get("after"), None);
}

// =============================================================================
// Verification Tests
// =============================================================================

#[test]
fn test_verify_counts_without_applying() {
    let (_temp, wal_path) = setup_temp_wal();
    write_scenario(&wal_path);

    let result = WalRecovery::verify(&wal_path).unwrap();

    assert_eq!(result.puts, 4);
    assert_eq!(result.deletes, 2);
    assert_eq!(result.lines, 6);
}

#[test]
fn test_verify_detects_corruption() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::write(&wal_path, "{\"op\":\"PUT\"}\n").unwrap();

    assert!(matches!(
        WalRecovery::verify(&wal_path),
        Err(KvError::WalDecode { line: 1, .. })
    ));
}

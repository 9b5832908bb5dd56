//! Tests for WAL Reader
//!
//! These tests verify:
//! - Sequential reads in append order
//! - Blank line tolerance
//! - Error reporting with line numbers
//! - Iterator behaviour

use std::fs;
use std::path::PathBuf;

use localkv::wal::{WalReader, WalRecord, WalWriter};
use localkv::KvError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

// =============================================================================
// Basic Reading Tests
// =============================================================================

#[test]
fn test_open_missing_file_fails() {
    let (_temp, wal_path) = setup_temp_wal();

    assert!(matches!(WalReader::open(&wal_path), Err(KvError::Io(_))));
}

#[test]
fn test_read_empty_file() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::write(&wal_path, "").unwrap();

    let mut reader = WalReader::open(&wal_path).unwrap();

    assert_eq!(reader.next_record().unwrap(), None);
    assert_eq!(reader.line_no(), 0);
}

#[test]
fn test_read_back_written_records() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path).unwrap();
    writer.append_put("a", "1").unwrap();
    writer.append_delete("a").unwrap();
    drop(writer);

    let mut reader = WalReader::open(&wal_path).unwrap();

    assert_eq!(reader.next_record().unwrap(), Some(WalRecord::put("a", "1")));
    assert_eq!(reader.next_record().unwrap(), Some(WalRecord::delete("a")));
    assert_eq!(reader.next_record().unwrap(), None);
    assert_eq!(reader.line_no(), 2);
}

// =============================================================================
// Blank Line Tests
// =============================================================================

#[test]
fn test_trailing_empty_lines_tolerated() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::write(
        &wal_path,
        "{\"op\":\"PUT\",\"key\":\"a\",\"value\":\"1\"}\n\n\n",
    )
    .unwrap();

    let records: Vec<_> = WalReader::open(&wal_path)
        .unwrap()
        .records()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(records, vec![WalRecord::put("a", "1")]);
}

#[test]
fn test_crlf_and_whitespace_lines_tolerated() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::write(
        &wal_path,
        "{\"op\":\"PUT\",\"key\":\"a\",\"value\":\"1\"}\r\n   \r\n{\"op\":\"DELETE\",\"key\":\"a\"}",
    )
    .unwrap();

    let records: Vec<_> = WalReader::open(&wal_path)
        .unwrap()
        .records()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(records, vec![WalRecord::put("a", "1"), WalRecord::delete("a")]);
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn test_malformed_line_reports_line_number() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::write(
        &wal_path,
        "{\"op\":\"PUT\",\"key\":\"a\",\"value\":\"1\"}\n\n{broken\n",
    )
    .unwrap();

    let mut reader = WalReader::open(&wal_path).unwrap();
    assert!(reader.next_record().unwrap().is_some());

    match reader.next_record() {
        Err(KvError::WalDecode { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected decode error, got {:?}", other),
    }
}

#[test]
fn test_iterator_stops_after_error() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::write(
        &wal_path,
        "{\"op\":\"PUT\",\"key\":\"a\",\"value\":\"1\"}\ngarbage\n{\"op\":\"PUT\",\"key\":\"b\",\"value\":\"2\"}\n",
    )
    .unwrap();

    let items: Vec<_> = WalReader::open(&wal_path).unwrap().records().collect();

    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    assert!(items[1].is_err());
}

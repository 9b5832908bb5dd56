//! Store Tests
//!
//! Tests verify:
//! - Basic CRUD operations
//! - Sorted index consistency
//! - Prefix scans
//! - Wholesale replacement
//! - Concurrent access patterns

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::thread;

use localkv::wal::WalRecord;
use localkv::Store;

// =============================================================================
// Helper Functions
// =============================================================================

fn store_with(keys: &[&str]) -> Store {
    let store = Store::new();
    for key in keys {
        store.put(key.to_string(), format!("v-{}", key));
    }
    store
}

/// The index must always equal the sorted, de-duplicated key set
fn assert_index_consistent(store: &Store) {
    let keys = store.keys();
    let mut expected: Vec<String> = store.snapshot().into_keys().collect();
    expected.sort();

    assert_eq!(keys, expected);
    assert!(keys.windows(2).all(|w| w[0] < w[1]), "index not strictly sorted");
    assert_eq!(keys.len(), store.len());
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_store_is_empty() {
    let store = Store::new();
    assert_eq!(store.len(), 0);
    assert!(store.is_empty());
    assert!(store.keys().is_empty());
}

#[test]
fn test_put_and_get() {
    let store = Store::new();

    assert!(store.put("key1".to_string(), "value1".to_string()));

    assert_eq!(store.get("key1"), Some("value1".to_string()));
    assert!(store.contains_key("key1"));
}

#[test]
fn test_get_nonexistent_key() {
    let store = Store::new();
    assert_eq!(store.get("nonexistent"), None);
}

#[test]
fn test_put_overwrites_existing() {
    let store = Store::new();

    assert!(store.put("key".to_string(), "old".to_string()));
    assert!(!store.put("key".to_string(), "new".to_string()));

    assert_eq!(store.get("key"), Some("new".to_string()));
    assert_eq!(store.len(), 1);
    assert_eq!(store.keys(), vec!["key".to_string()]);
}

#[test]
fn test_put_is_idempotent() {
    let store = Store::new();

    store.put("k".to_string(), "v".to_string());
    let first = store.snapshot();
    store.put("k".to_string(), "v".to_string());

    assert_eq!(store.snapshot(), first);
    assert_index_consistent(&store);
}

#[test]
fn test_delete_existing() {
    let store = store_with(&["a", "b"]);

    assert!(store.delete("a"));

    assert_eq!(store.get("a"), None);
    assert_eq!(store.keys(), vec!["b".to_string()]);
}

#[test]
fn test_delete_missing_is_noop() {
    let store = store_with(&["a"]);

    assert!(!store.delete("zzz"));

    assert_eq!(store.len(), 1);
    assert_index_consistent(&store);
}

#[test]
fn test_apply_records() {
    let store = Store::new();

    store.apply(&WalRecord::put("x", "1"));
    store.apply(&WalRecord::put("y", "2"));
    store.apply(&WalRecord::delete("x"));

    assert_eq!(store.get("x"), None);
    assert_eq!(store.get("y"), Some("2".to_string()));
}

// =============================================================================
// Index Tests
// =============================================================================

#[test]
fn test_index_sorted_after_random_inserts() {
    let store = store_with(&["delta", "alpha", "charlie", "bravo", "echo"]);

    assert_eq!(
        store.keys(),
        vec!["alpha", "bravo", "charlie", "delta", "echo"]
    );
}

#[test]
fn test_index_consistent_over_mixed_operations() {
    let store = Store::new();

    // Deterministic pseudo-random sequence of puts and deletes
    let mut seed: u32 = 7;
    for _ in 0..500 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let key = format!("k{}", (seed >> 8) % 40);
        if (seed >> 4) % 3 == 0 {
            store.delete(&key);
        } else {
            store.put(key, seed.to_string());
        }
        assert_index_consistent(&store);
    }
}

// =============================================================================
// Prefix Scan Tests
// =============================================================================

#[test]
fn test_prefix_scan_matches_only_prefix() {
    let store = store_with(&["a", "ab", "abc", "b"]);

    let result = store.prefix_scan("ab");

    let expected: BTreeMap<String, String> = [
        ("ab".to_string(), "v-ab".to_string()),
        ("abc".to_string(), "v-abc".to_string()),
    ]
    .into_iter()
    .collect();
    assert_eq!(result, expected);
}

#[test]
fn test_prefix_scan_empty_prefix_returns_all() {
    let store = store_with(&["a", "ab", "abc", "b"]);

    let result = store.prefix_scan("");

    assert_eq!(result.len(), 4);
    assert_eq!(result, store.snapshot());
}

#[test]
fn test_prefix_scan_does_not_stop_early() {
    let store = store_with(&["ab", "ba", "bb", "c"]);

    let result: Vec<String> = store.prefix_scan("b").into_keys().collect();

    assert_eq!(result, vec!["ba", "bb"]);
}

#[test]
fn test_prefix_scan_includes_exact_key() {
    let store = store_with(&["user", "user:1", "user:2", "users", "v"]);

    let result: Vec<String> = store.prefix_scan("user").into_keys().collect();

    assert_eq!(result, vec!["user", "user:1", "user:2", "users"]);
}

#[test]
fn test_prefix_scan_no_match() {
    let store = store_with(&["a", "b"]);

    assert!(store.prefix_scan("zz").is_empty());
    assert!(store.prefix_scan("aa").is_empty());
}

#[test]
fn test_prefix_scan_after_delete() {
    let store = store_with(&["p1", "p2", "p3"]);
    store.delete("p2");

    let result: Vec<String> = store.prefix_scan("p").into_keys().collect();

    assert_eq!(result, vec!["p1", "p3"]);
}

// =============================================================================
// Replace / Snapshot Tests
// =============================================================================

#[test]
fn test_replace_swaps_everything() {
    let store = store_with(&["old1", "old2"]);

    let mut data = HashMap::new();
    data.insert("new2".to_string(), "b".to_string());
    data.insert("new1".to_string(), "a".to_string());

    let count = store.replace(data);

    assert_eq!(count, 2);
    assert_eq!(store.get("old1"), None);
    assert_eq!(store.keys(), vec!["new1", "new2"]);
    assert_index_consistent(&store);
}

#[test]
fn test_replace_with_empty_clears() {
    let store = store_with(&["a", "b"]);

    store.replace(HashMap::new());

    assert!(store.is_empty());
    assert!(store.keys().is_empty());
}

#[test]
fn test_snapshot_is_a_copy() {
    let store = store_with(&["a"]);

    let snap = store.snapshot();
    store.put("b".to_string(), "2".to_string());

    assert_eq!(snap.len(), 1);
    assert_eq!(store.len(), 2);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_writers_distinct_keys() {
    let store = Arc::new(Store::new());
    let mut handles = vec![];

    for t in 0..8 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for i in 0..100 {
                store.put(format!("t{}-{:03}", t, i), i.to_string());
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), 800);
    assert_index_consistent(&store);
    assert_eq!(store.prefix_scan("t3-").len(), 100);
}

#[test]
fn test_readers_never_see_torn_replace() {
    let store = Arc::new(Store::new());

    let full: HashMap<String, String> =
        (0..50).map(|i| (format!("k{:02}", i), "x".to_string())).collect();

    let writer = {
        let store = Arc::clone(&store);
        let full = full.clone();
        thread::spawn(move || {
            for round in 0..200 {
                if round % 2 == 0 {
                    store.replace(full.clone());
                } else {
                    store.replace(HashMap::new());
                }
            }
        })
    };

    let reader = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for _ in 0..200 {
                let len = store.prefix_scan("k").len();
                assert!(len == 0 || len == 50, "observed torn state: {}", len);
            }
        })
    };

    writer.join().unwrap();
    reader.join().unwrap();
}

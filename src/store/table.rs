//! Store implementation
//!
//! HashMap + BTreeSet index behind a parking_lot RwLock.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;

use parking_lot::RwLock;

use crate::wal::WalRecord;

/// Concurrency-safe in-memory key-value map with a sorted key index
///
/// Invariant: `index` holds exactly the keys of `data`, in ascending
/// lexicographic order. Both are only ever touched under the same lock.
pub struct Store {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    /// Primary mapping
    data: HashMap<String, String>,

    /// Sorted secondary index over `data`'s keys
    index: BTreeSet<String>,
}

impl Store {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Insert or overwrite a key (write lock)
    ///
    /// Returns `true` if the key was not present before.
    pub fn put(&self, key: String, value: String) -> bool {
        let mut inner = self.inner.write();

        match inner.data.insert(key.clone(), value) {
            Some(_) => false,
            None => {
                inner.index.insert(key);
                true
            }
        }
    }

    /// Get a value by key (read lock)
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.read().data.get(key).cloned()
    }

    /// Remove a key (write lock)
    ///
    /// Returns whether the key was present; removing a missing key is a no-op.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.write();

        if inner.data.remove(key).is_none() {
            return false;
        }
        inner.index.remove(key);
        true
    }

    /// Apply a logged mutation with the same semantics as a live put/delete
    pub fn apply(&self, record: &WalRecord) {
        match record {
            WalRecord::Put { key, value } => {
                self.put(key.clone(), value.clone());
            }
            WalRecord::Delete { key } => {
                self.delete(key);
            }
        }
    }

    /// All entries whose key starts with `prefix` (read lock)
    ///
    /// Every key sharing a prefix sorts at or after the prefix itself and
    /// before any non-matching key greater than the prefix, so the matches
    /// form one contiguous run in the index beginning at `prefix`.
    pub fn prefix_scan(&self, prefix: &str) -> BTreeMap<String, String> {
        let inner = self.inner.read();

        inner
            .index
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|key| key.starts_with(prefix))
            .filter_map(|key| {
                inner
                    .data
                    .get(key)
                    .map(|value| (key.clone(), value.clone()))
            })
            .collect()
    }

    /// Swap in an entirely new mapping and rebuild the index (write lock)
    ///
    /// Readers observe either the old state or the new one, never a mix.
    /// Returns the number of keys now present.
    pub fn replace(&self, data: HashMap<String, String>) -> usize {
        let index: BTreeSet<String> = data.keys().cloned().collect();
        let count = data.len();

        let mut inner = self.inner.write();
        inner.data = data;
        inner.index = index;

        count
    }

    /// Consistent point-in-time copy of the mapping (read lock)
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        let inner = self.inner.read();

        inner
            .data
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// All keys in ascending order, as maintained by the index
    pub fn keys(&self) -> Vec<String> {
        self.inner.read().index.iter().cloned().collect()
    }

    /// Check whether a key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.read().data.contains_key(key)
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.inner.read().data.len()
    }

    /// Check if the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.inner.read().data.is_empty()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

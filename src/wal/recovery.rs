//! WAL Recovery
//!
//! Rebuilds store state by replaying the WAL.

use std::path::Path;

use crate::error::Result;
use crate::store::Store;

use super::{WalReader, WalRecord};

/// Replays a WAL file into a store
pub struct WalRecovery;

/// Result of a replay (or verification) pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// PUT records seen
    pub puts: u64,

    /// DELETE records seen
    pub deletes: u64,

    /// Lines consumed, blank ones included
    pub lines: u64,
}

impl RecoveryResult {
    /// Total number of records
    pub fn records(&self) -> u64 {
        self.puts + self.deletes
    }

    fn count(&mut self, record: &WalRecord) {
        match record {
            WalRecord::Put { .. } => self.puts += 1,
            WalRecord::Delete { .. } => self.deletes += 1,
        }
    }
}

impl WalRecovery {
    /// Apply every record of the WAL at `path` to `store`, in file order
    ///
    /// A malformed record aborts the replay with `WalDecode`; records
    /// applied before it stay applied.
    pub fn replay(path: &Path, store: &Store) -> Result<RecoveryResult> {
        let mut reader = WalReader::open(path)?;
        let mut result = RecoveryResult::default();

        while let Some(record) = reader.next_record()? {
            store.apply(&record);
            result.count(&record);
        }
        result.lines = reader.line_no();

        tracing::debug!(
            path = %path.display(),
            puts = result.puts,
            deletes = result.deletes,
            "WAL replayed"
        );

        Ok(result)
    }

    /// Decode the whole WAL without applying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        let mut reader = WalReader::open(path)?;
        let mut result = RecoveryResult::default();

        while let Some(record) = reader.next_record()? {
            result.count(&record);
        }
        result.lines = reader.line_no();

        Ok(result)
    }
}

//! Engine Module
//!
//! The core storage engine that coordinates all components.
//!
//! ## Responsibilities
//! - Recover state on startup (snapshot -> WAL replay -> WAL reopen)
//! - Log every mutation to the WAL before applying it to the Store
//! - Checkpoint: snapshot + WAL truncation as one barrier-protected step
//! - Route protocol commands to operations

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::config::Config;
use crate::error::{KvError, Result};
use crate::protocol::{Command, Response};
use crate::snapshot::{self, SnapshotInfo};
use crate::store::Store;
use crate::wal::{RecoveryResult, WalRecord, WalRecovery, WalWriter};

/// What startup recovery found on disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Keys loaded from the snapshot, if one existed
    pub snapshot_keys: Option<usize>,

    /// Replay counts, if a WAL existed
    pub wal: Option<RecoveryResult>,
}

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (put/delete/checkpoint/reload): Serialized by `write_lock`
///   - Only ONE write operation at a time
///   - Must acquire: write_lock → WAL → store (write)
///   - Holding `write_lock` across "append then apply" keeps the store's
///     per-key order identical to the WAL's
///
/// - **Reads** (get/scan): Concurrent
///   - No write_lock needed
///   - Store uses internal RwLock (many concurrent readers)
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Snapshot location
    snapshot_path: PathBuf,

    /// Write-ahead log for durability (exclusive access needed)
    wal: Mutex<WalWriter>,

    /// In-memory authoritative state (internal RwLock)
    store: Store,

    /// Serializes write operations (put/delete/checkpoint/reload)
    write_lock: Mutex<()>,

    /// Startup recovery summary
    recovery: RecoveryReport,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create data directory
    /// 2. Load the snapshot if it exists
    /// 3. Replay the WAL on top if it exists
    /// 4. Open the WAL for append
    /// 5. Ready to serve requests
    ///
    /// Any failure aborts startup; a malformed WAL is not skipped.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        // Step 1: Create data directory if it doesn't exist
        fs::create_dir_all(&config.data_dir)?;

        let snapshot_path = config.snapshot_path();
        let wal_path = config.wal_path();
        let store = Store::new();
        let mut recovery = RecoveryReport::default();

        // Step 2: Snapshot
        if snapshot_path.exists() {
            let keys = snapshot::load(&snapshot_path, &store)?;
            recovery.snapshot_keys = Some(keys);
        }

        // Step 3: WAL replay, applied on top of the snapshot
        if wal_path.exists() {
            let result = WalRecovery::replay(&wal_path, &store)?;
            recovery.wal = Some(result);
        }

        // Step 4: WAL for new appends
        let wal = WalWriter::open(&wal_path)?;

        tracing::info!(
            data_dir = %config.data_dir.display(),
            snapshot_keys = ?recovery.snapshot_keys,
            wal_records = recovery.wal.map(|r| r.records()).unwrap_or(0),
            keys = store.len(),
            "Engine recovered"
        );

        Ok(Self {
            config,
            snapshot_path,
            wal: Mutex::new(wal),
            store,
            write_lock: Mutex::new(()),
            recovery,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let mut config = Config::default();
        config.data_dir = path.to_path_buf();
        Self::open(config)
    }

    fn lock_writes(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|e| KvError::LockPoisoned(format!("Write lock poisoned: {}", e)))
    }

    fn lock_wal(&self) -> Result<MutexGuard<'_, WalWriter>> {
        self.wal
            .lock()
            .map_err(|e| KvError::LockPoisoned(format!("WAL lock poisoned: {}", e)))
    }

    /// Append to the WAL, then apply to the store
    ///
    /// Caller must hold `write_lock`. If the append fails nothing is applied.
    fn log_and_apply(&self, record: WalRecord) -> Result<bool> {
        self.lock_wal()?.append(&record)?;

        let changed = match record {
            WalRecord::Put { key, value } => self.store.put(key, value),
            WalRecord::Delete { key } => self.store.delete(&key),
        };
        Ok(changed)
    }

    /// Execute a command
    ///
    /// Routes data commands to the matching operation. `NotFound` is a
    /// normal response, not an error.
    pub fn execute(&self, command: Command) -> Result<Response> {
        tracing::trace!(?command, "execute");

        match command {
            Command::Put { key, value } => {
                self.put(&key, &value)?;
                Ok(Response::Ok)
            }
            Command::Get { key } => Ok(match self.get(&key) {
                Some(value) => Response::Value(value),
                None => Response::NotFound,
            }),
            Command::Delete { key } => Ok(if self.delete(&key)? {
                Response::Ok
            } else {
                Response::NotFound
            }),
            Command::Scan { prefix } => Ok(Response::entries(&self.scan(&prefix))),
            Command::Save => {
                self.checkpoint()?;
                Ok(Response::Ok)
            }
            Command::Load => {
                self.reload()?;
                Ok(Response::Ok)
            }
            Command::Ping => Ok(Response::Pong),
            Command::Help => Ok(Response::help()),
            Command::Quit => Ok(Response::Bye),
        }
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<String> {
        self.store.get(key)
    }

    /// Put a key-value pair
    ///
    /// Steps:
    /// 1. Acquire write lock
    /// 2. Write to WAL (durable before returning)
    /// 3. Write to store
    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        let _write_guard = self.lock_writes()?;

        self.log_and_apply(WalRecord::put(key, value))?;
        tracing::debug!(key, "put");
        Ok(())
    }

    /// Delete a key
    ///
    /// The delete is logged even when the key is absent. Returns whether the
    /// key was present.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let _write_guard = self.lock_writes()?;

        let found = self.log_and_apply(WalRecord::delete(key))?;
        tracing::debug!(key, found, "delete");
        Ok(found)
    }

    /// All entries whose key starts with `prefix`
    pub fn scan(&self, prefix: &str) -> BTreeMap<String, String> {
        self.store.prefix_scan(prefix)
    }

    /// Snapshot the store and truncate the WAL
    ///
    /// Runs under the write lock so no mutation can slip in between the
    /// snapshot and the truncation. The WAL is only truncated once the
    /// snapshot rename succeeded; a failed save leaves the WAL untouched.
    pub fn checkpoint(&self) -> Result<SnapshotInfo> {
        let _write_guard = self.lock_writes()?;

        let info = snapshot::save(&self.store, &self.snapshot_path)?;

        let mut wal = self.lock_wal()?;
        let discarded = wal.records_written();
        wal.truncate()?;

        tracing::info!(
            keys = info.keys,
            wal_records = discarded,
            "Checkpoint complete; WAL reset"
        );
        Ok(info)
    }

    /// Replace the store with the on-disk snapshot, leaving the WAL alone
    ///
    /// Returns the number of keys loaded. On error the store is unchanged.
    pub fn reload(&self) -> Result<usize> {
        let _write_guard = self.lock_writes()?;

        snapshot::load(&self.snapshot_path, &self.store)
    }

    /// Close the engine gracefully
    ///
    /// Syncs and closes the WAL.
    pub fn close(self) -> Result<()> {
        let _write_guard = self.lock_writes()?;
        let mut wal = self.lock_wal()?;
        wal.close()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the snapshot file path
    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Get the WAL file path
    pub fn wal_path(&self) -> PathBuf {
        self.config.wal_path()
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if the engine holds no keys
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// All keys in ascending order
    pub fn keys(&self) -> Vec<String> {
        self.store.keys()
    }

    /// What startup recovery loaded
    pub fn recovery_report(&self) -> RecoveryReport {
        self.recovery
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

//! Snapshot save/load

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{KvError, Result};
use crate::store::Store;

/// Outcome of a successful save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotInfo {
    /// Final snapshot location
    pub path: PathBuf,

    /// Keys written
    pub keys: usize,

    /// Document size in bytes
    pub size_bytes: u64,
}

/// Temporary file a save writes to before renaming: `<path>.tmp`
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write a point-in-time copy of `store` to `path` atomically
///
/// 1. Copy the mapping under the store's read lock
/// 2. Serialize and write `<path>.tmp`, then sync it
/// 3. Rename over `path`
///
/// On failure the temp file is removed and `path` is left as it was.
pub fn save(store: &Store, path: &Path) -> Result<SnapshotInfo> {
    let data = store.snapshot();
    let bytes =
        serde_json::to_vec_pretty(&data).map_err(|e| KvError::Serialization(e.to_string()))?;

    let temp = temp_path(path);

    if temp.exists() {
        tracing::warn!(path = %temp.display(), "Removing stale snapshot temp file");
        let _ = fs::remove_file(&temp);
    }

    if let Err(e) = write_synced(&temp, &bytes) {
        tracing::warn!(path = %temp.display(), error = %e, "Snapshot write failed, cleaning up temp file");
        let _ = fs::remove_file(&temp);
        return Err(e);
    }

    if let Err(e) = fs::rename(&temp, path) {
        tracing::warn!(path = %temp.display(), error = %e, "Snapshot rename failed, cleaning up temp file");
        let _ = fs::remove_file(&temp);
        return Err(e.into());
    }

    tracing::info!(
        path = %path.display(),
        keys = data.len(),
        size_bytes = bytes.len(),
        "Snapshot saved"
    );

    Ok(SnapshotInfo {
        path: path.to_path_buf(),
        keys: data.len(),
        size_bytes: bytes.len() as u64,
    })
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

/// Replace the contents of `store` with the snapshot at `path`
///
/// The file is fully read and decoded before the store is touched, so any
/// error leaves the store unchanged. Returns the number of keys loaded.
pub fn load(path: &Path, store: &Store) -> Result<usize> {
    let bytes = fs::read(path)?;

    let data: HashMap<String, String> =
        serde_json::from_slice(&bytes).map_err(|e| KvError::SnapshotDecode(e.to_string()))?;

    let count = store.replace(data);
    tracing::info!(path = %path.display(), keys = count, "Snapshot loaded");

    Ok(count)
}

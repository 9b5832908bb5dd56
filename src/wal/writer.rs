//! WAL Writer
//!
//! Handles appending records to the WAL file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{KvError, Result};

use super::WalRecord;

/// Appends records to the WAL file
///
/// Every append is flushed and synced before it returns, so a record is
/// durable once `append` reports success.
pub struct WalWriter {
    /// Location of the log file
    path: PathBuf,

    /// Buffered append handle; `None` once closed
    writer: Option<BufWriter<File>>,

    /// Records appended through this handle since it was (re)opened
    records_written: u64,
}

impl WalWriter {
    /// Open or create a WAL file for appending
    ///
    /// Existing content is kept.
    pub fn open(path: &Path) -> Result<Self> {
        let writer = Self::open_file(path)?;

        tracing::debug!(path = %path.display(), "WAL opened for append");

        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(writer),
            records_written: 0,
        })
    }

    fn open_file(path: &Path) -> Result<BufWriter<File>> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(BufWriter::new(file))
    }

    /// Append a record and make it durable
    ///
    /// A failed write, flush or sync closes the writer: buffered bytes of the
    /// failed record are discarded and the file is cut back to its length
    /// before the append, so a rejected record can never reach the log later.
    pub fn append(&mut self, record: &WalRecord) -> Result<()> {
        let line = record.encode()?;
        let writer = self.writer.as_mut().ok_or(KvError::WalClosed)?;
        let len_before = writer.get_ref().metadata()?.len();

        if let Err(e) = Self::write_durable(writer, &line) {
            self.fail_closed(len_before, &e);
            return Err(e.into());
        }

        self.records_written += 1;
        tracing::trace!(key = record.key(), bytes = line.len(), "WAL record appended");

        Ok(())
    }

    fn write_durable(writer: &mut BufWriter<File>, line: &[u8]) -> io::Result<()> {
        writer.write_all(line)?;
        writer.flush()?;
        writer.get_ref().sync_data()
    }

    fn fail_closed(&mut self, len_before: u64, cause: &io::Error) {
        let Some(writer) = self.writer.take() else {
            return;
        };
        // into_parts drops the unwritten buffer instead of flushing it
        let (file, _unwritten) = writer.into_parts();

        if let Err(e) = file.set_len(len_before).and_then(|()| file.sync_data()) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to roll back partial WAL append"
            );
        }

        tracing::error!(
            path = %self.path.display(),
            error = %cause,
            "WAL append failed; writer closed"
        );
    }

    /// Log a PUT
    pub fn append_put(&mut self, key: &str, value: &str) -> Result<()> {
        self.append(&WalRecord::put(key, value))
    }

    /// Log a DELETE
    pub fn append_delete(&mut self, key: &str) -> Result<()> {
        self.append(&WalRecord::delete(key))
    }

    /// Release the file handle
    ///
    /// Later appends fail with `WalClosed`. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            writer.get_ref().sync_all()?;
            tracing::debug!(path = %self.path.display(), "WAL closed");
        }
        Ok(())
    }

    /// Discard the whole log and start a fresh, empty one
    ///
    /// Close -> remove file -> reopen. If reopening fails the writer stays
    /// closed, so no mutation can be acknowledged without a working log.
    pub fn truncate(&mut self) -> Result<()> {
        self.close()?;

        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        self.writer = Some(Self::open_file(&self.path)?);
        self.records_written = 0;

        tracing::info!(path = %self.path.display(), "WAL truncated");
        Ok(())
    }

    /// Whether appends are currently accepted
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Records appended since this handle was opened or last truncated
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WalWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to close WAL on drop");
        }
    }
}

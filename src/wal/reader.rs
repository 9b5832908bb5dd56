//! WAL Reader
//!
//! Handles reading records from the WAL file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::Result;

use super::WalRecord;

/// Reads records from the WAL file in append order
pub struct WalReader {
    reader: BufReader<File>,

    /// 1-based number of the last line read
    line_no: u64,

    /// Reused line buffer
    buf: String,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;

        Ok(Self {
            reader: BufReader::new(file),
            line_no: 0,
            buf: String::new(),
        })
    }

    /// Read the next record from the WAL
    ///
    /// Blank lines are skipped. Returns `Ok(None)` at end of file.
    pub fn next_record(&mut self) -> Result<Option<WalRecord>> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }

            return WalRecord::decode(line, self.line_no).map(Some);
        }
    }

    /// Number of lines consumed so far
    pub fn line_no(&self) -> u64 {
        self.line_no
    }

    /// Iterate over all records
    ///
    /// The iterator stops after yielding the first error.
    pub fn records(self) -> WalIterator {
        WalIterator {
            reader: self,
            failed: false,
        }
    }
}

/// Iterator over WAL records
pub struct WalIterator {
    reader: WalReader,
    failed: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        match self.reader.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

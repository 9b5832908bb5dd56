//! WAL record definitions
//!
//! One mutation per line, encoded as a JSON object tagged by `op`.

use serde::{Deserialize, Serialize};

use crate::error::{KvError, Result};

/// A single logged mutation
///
/// Wire form:
/// ```text
/// {"op":"PUT","key":"k","value":"v"}
/// {"op":"DELETE","key":"k"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum WalRecord {
    /// Insert or overwrite a key
    #[serde(rename = "PUT")]
    Put {
        key: String,
        /// Writers that drop empty values still decode as `""`
        #[serde(default)]
        value: String,
    },

    /// Remove a key
    #[serde(rename = "DELETE")]
    Delete { key: String },
}

impl WalRecord {
    /// Create a PUT record
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        WalRecord::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a DELETE record
    pub fn delete(key: impl Into<String>) -> Self {
        WalRecord::Delete { key: key.into() }
    }

    /// The key this record mutates
    pub fn key(&self) -> &str {
        match self {
            WalRecord::Put { key, .. } | WalRecord::Delete { key } => key,
        }
    }

    /// Encode as one newline-terminated line
    ///
    /// JSON escapes control characters, so keys and values containing
    /// `\n` never break the line framing.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut line =
            serde_json::to_vec(self).map_err(|e| KvError::Serialization(e.to_string()))?;
        line.push(b'\n');
        Ok(line)
    }

    /// Decode one line (without its terminator)
    ///
    /// `line_no` is 1-based and only used for error reporting.
    pub fn decode(line: &str, line_no: u64) -> Result<Self> {
        serde_json::from_str(line).map_err(|e| KvError::WalDecode {
            line: line_no,
            reason: e.to_string(),
        })
    }
}

//! Write-Ahead Log (WAL) Module
//!
//! Provides durability guarantees through append-only logging.
//!
//! ## Responsibilities
//! - Append a record before any mutation becomes visible
//! - Flush + sync every append before acknowledging it
//! - Sequential replay after a restart
//! - Whole-log truncation once a snapshot has captured its content
//!
//! ## File Format
//! ```text
//! {"op":"PUT","key":"user:1","value":"alice"}\n
//! {"op":"PUT","key":"user:2","value":"bob"}\n
//! {"op":"DELETE","key":"user:1"}\n
//! ```
//! Line position is the order of application. Blank lines are ignored.

mod entry;
mod writer;
mod reader;
mod recovery;

pub use entry::WalRecord;
pub use writer::WalWriter;
pub use reader::{WalIterator, WalReader};
pub use recovery::{RecoveryResult, WalRecovery};

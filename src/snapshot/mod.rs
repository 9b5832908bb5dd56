//! Snapshot Module
//!
//! Whole-state checkpoints, independent of the WAL.
//!
//! ## File Format
//! A single pretty-printed JSON object mapping every key to its value:
//! ```text
//! {
//!   "user:1": "alice",
//!   "user:2": "bob"
//! }
//! ```
//! Keys are written in sorted order, but readers rebuild their own index
//! and do not depend on it. The document carries no log position: it is
//! only consistent with an empty WAL, which is why the engine truncates
//! the WAL right after every successful save.
//!
//! ## Atomicity
//! Saves go to `<path>.tmp`, are synced, then renamed over `<path>`. A
//! crash at any point leaves either the old or the new snapshot in place.

mod codec;

pub use codec::{load, save, temp_path, SnapshotInfo};

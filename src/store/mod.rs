//! Store Module
//!
//! The authoritative in-memory state.
//!
//! ## Responsibilities
//! - Key -> value mapping (one value per key)
//! - Sorted secondary key index for ordered prefix scans
//! - Many-readers / one-writer access pattern
//! - Atomic wholesale replacement (snapshot load)
//!
//! ## Data Structure Choice
//! `HashMap` for point lookups plus a `BTreeSet` of keys for ordered
//! access, both behind a single `RwLock` so the two can never disagree.
//! The store never touches disk; durability is the engine's job.

mod table;

pub use table::Store;

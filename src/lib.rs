//! # LocalKV
//!
//! An embeddable single-node key-value store with:
//! - Write-Ahead Logging (WAL) for durability, synced on every mutation
//! - Manual snapshot checkpoints with WAL truncation
//! - Sorted key index for prefix scans
//! - Line-oriented text protocol over a REPL or TCP
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────┐   ┌──────────────────────┐
//! │     TCP Server       │   │        REPL          │
//! │  (conn. threads)     │   │   (localkv-cli)      │
//! └──────────┬───────────┘   └──────────┬───────────┘
//!            └─────────────┬────────────┘
//!                          ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                      Engine                         │
//! │   recovery · append-then-apply · checkpoint         │
//! └──────┬───────────────────┬──────────────────┬───────┘
//!        │ 1. append+sync    │ 2. apply         │ SAVE / LOAD
//!        ▼                   ▼                  ▼
//!  ┌───────────┐      ┌─────────────┐     ┌───────────┐
//!  │    WAL    │      │    Store    │     │ Snapshot  │
//!  │ data.wal  │      │  (RwLock)   │     │ data.json │
//!  └───────────┘      └─────────────┘     └───────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod store;
pub mod snapshot;
pub mod network;
pub mod protocol;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::Config;
pub use engine::{Engine, RecoveryReport};
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of LocalKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! # nexus-store
//!
//! Persistence Adapter for the Nexus engine.
//!
//! Every entity collection is stored as one named JSON snapshot in a
//! key-value backend. The crate ships a SQLite-backed [`Database`] and an
//! in-memory [`MemoryBackend`]; both implement [`SnapshotBackend`], and
//! [`Snapshots`] layers the typed, never-failing `load` on top.

pub mod database;
pub mod memory;
pub mod migrations;
pub mod models;
pub mod snapshots;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use memory::MemoryBackend;
pub use models::*;
pub use snapshots::{SnapshotBackend, Snapshots};

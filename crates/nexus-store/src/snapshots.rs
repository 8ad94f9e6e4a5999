//! Typed load/save port over a [`SnapshotBackend`].
//!
//! Loading never fails: a missing key, an unreadable backend, or a snapshot
//! that no longer parses all fall back to the caller's default and are
//! logged. Saving reports errors so the caller can decide how loud to be.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;

/// A durable key-value substrate for named JSON snapshots.
pub trait SnapshotBackend: Send {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, json: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

pub struct Snapshots {
    backend: Box<dyn SnapshotBackend>,
}

impl Snapshots {
    pub fn new(backend: impl SnapshotBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Load `key`, falling back to `default` on any failure.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.load_or_else(key, || default)
    }

    /// Like [`Snapshots::load`] but only builds the default when needed.
    pub fn load_or_else<T, F>(&self, key: &str, default: F) -> T
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        let raw = match self.backend.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "no snapshot stored, using default");
                return default();
            }
            Err(e) => {
                warn!(key, error = %e, "snapshot read failed, using default");
                return default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "snapshot is corrupt, using default");
                default()
            }
        }
    }

    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.backend.write(key, &json)?;
        debug!(key, bytes = json.len(), "snapshot saved");
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.backend.remove(key)
    }
}

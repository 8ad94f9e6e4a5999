//! In-memory snapshot backend.
//!
//! Cloning a [`MemoryBackend`] yields a handle onto the same map, which lets
//! tests simulate a process restart by building a second engine over it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Result, StoreError};
use crate::snapshots::SnapshotBackend;

#[derive(Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<Mutex<HashMap<String, String>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Store a raw value, bypassing serialization. Used to plant corrupt
    /// snapshots.
    pub fn put_raw(&self, key: &str, raw: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), raw.to_string());
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory backend switched off".into()));
        }
        Ok(())
    }
}

impl SnapshotBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        self.check()?;
        let entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("Lock poisoned: {e}")))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, json: &str) -> Result<()> {
        self.check()?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("Lock poisoned: {e}")))?;
        entries.insert(key.to_string(), json.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.check()?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("Lock poisoned: {e}")))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let a = MemoryBackend::new();
        let b = a.clone();
        a.write("users", "[]").unwrap();
        assert_eq!(b.read("users").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn unavailable_backend_fails_every_call() {
        let backend = MemoryBackend::new();
        backend.set_unavailable(true);
        assert!(backend.write("users", "[]").is_err());
        assert!(backend.read("users").is_err());

        backend.set_unavailable(false);
        assert!(backend.write("users", "[]").is_ok());
    }
}

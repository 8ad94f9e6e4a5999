//! SQLite connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation. Snapshots live in a single
//! `snapshots` table keyed by collection name.

use std::path::{Path, PathBuf};

use chrono::Utc;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, StoreError};
use crate::migrations;
use crate::snapshots::SnapshotBackend;

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the default application database.
    ///
    /// The database file is placed in the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/nexus/nexus.db`
    /// - macOS:   `~/Library/Application Support/com.nexus.nexus/nexus.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\nexus\nexus\data\nexus.db`
    pub fn open_default() -> Result<Self> {
        let path = Self::default_path()?;
        Self::open_at(&path)
    }

    /// Resolve the default database path, creating its directory.
    pub fn default_path() -> Result<PathBuf> {
        let project_dirs =
            ProjectDirs::from("com", "nexus", "nexus").ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(data_dir.join("nexus.db"))
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "opening database");

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        migrations::run_migrations(&conn)?;

        Ok(Self { conn })
    }

    /// Open a private in-memory database. Nothing survives the handle.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }
}

impl SnapshotBackend for Database {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let json = self
            .conn
            .query_row(
                "SELECT json FROM snapshots WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(json)
    }

    fn write(&self, key: &str, json: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO snapshots (key, json, updated_at) VALUES (?1, ?2, ?3)",
            params![key, json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM snapshots WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        let db = Database::open_at(&path).expect("should open");
        assert!(db.path().is_some());
    }

    #[test]
    fn snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reopen.db");

        {
            let db = Database::open_at(&path).unwrap();
            db.write("posts", "[1,2,3]").unwrap();
        }

        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.read("posts").unwrap().as_deref(), Some("[1,2,3]"));
    }

    #[test]
    fn write_replaces_and_remove_clears() {
        let db = Database::open_in_memory().unwrap();
        db.write("session", "\"a\"").unwrap();
        db.write("session", "\"b\"").unwrap();
        assert_eq!(db.read("session").unwrap().as_deref(), Some("\"b\""));

        db.remove("session").unwrap();
        assert_eq!(db.read("session").unwrap(), None);

        // Removing a missing key is not an error.
        db.remove("session").unwrap();
    }
}

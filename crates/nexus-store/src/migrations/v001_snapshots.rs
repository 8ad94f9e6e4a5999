//! v001 -- Snapshot table.
//!
//! One row per entity collection; `json` holds the serialized collection.

use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS snapshots (
    key        TEXT PRIMARY KEY NOT NULL,   -- collection name (posts, users, ...)
    json       TEXT NOT NULL,               -- serde_json encoding of the collection
    updated_at TEXT NOT NULL                -- RFC-3339
);
"#;

/// Apply the v001 migration.
pub fn up(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(UP_SQL)
}

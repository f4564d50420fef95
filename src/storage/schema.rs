//! Database schema, embedded at compile time.

use rusqlite::{Connection, Result};

/// Current schema version, tracked via `PRAGMA user_version`.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the stitchtrack database.
///
/// `image_paths` is a JSON array of absolute path strings; order is
/// significant (the position of a path is part of backup image naming).
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL DEFAULT 'single',
    title TEXT NOT NULL,
    stitch_count INTEGER NOT NULL DEFAULT 0,
    stitch_step INTEGER NOT NULL DEFAULT 1,
    row_count INTEGER NOT NULL DEFAULT 0,
    row_step INTEGER NOT NULL DEFAULT 1,
    total_rows INTEGER NOT NULL DEFAULT 0,
    image_paths TEXT NOT NULL DEFAULT '[]'
);

CREATE INDEX IF NOT EXISTS idx_projects_title ON projects(title);
"#;

/// Apply the schema to a connection.
///
/// Idempotent and safe to call on every open.
///
/// # Errors
///
/// Returns an error if any schema statement fails.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version < CURRENT_SCHEMA_VERSION {
        conn.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)?;
    }

    Ok(())
}

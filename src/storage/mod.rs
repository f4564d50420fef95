//! SQLite storage layer for stitchtrack.
//!
//! Persistence uses a single `projects` table. The backup subsystem only
//! ever sees this store through two calls: a full snapshot read at export
//! time, and one upsert per record at import time.

pub mod schema;
pub mod sqlite;

pub use sqlite::SqliteStorage;

//! Initialize the StitchTrack database.
//!
//! Creates the database file at the resolved location and applies the
//! schema. The database is global per machine; backup archives, not the
//! database file, are the unit of portability.

use crate::config::resolve_db_path;
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns `AlreadyInitialized` if the database exists and `--force` was
/// not given, or an error if the file cannot be created.
pub fn execute(force: bool, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let db_path = resolve_db_path(db_path.map(|p| p.as_path()))
        .ok_or_else(|| Error::Other("Could not determine database location".to_string()))?;

    if db_path.exists() {
        if !force {
            return Err(Error::AlreadyInitialized { path: db_path });
        }
        fs::remove_file(&db_path)?;
    }

    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Opening applies the schema.
    let _storage = SqliteStorage::open(&db_path)?;

    if json {
        let output = InitOutput {
            database: db_path,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Initialized StitchTrack database");
        println!("  Database: {}", db_path.display());
    }

    Ok(())
}

//! Configuration management.
//!
//! This module resolves where the project database lives. StitchTrack keeps
//! a single global database in the platform data directory; backup archives
//! are the unit of portability, not the database file itself.

use std::path::{Path, PathBuf};

/// Get the global StitchTrack data directory location.
///
/// Uses the platform convention from `directories` (e.g.
/// `~/.local/share/stitchtrack` on Linux).
#[must_use]
pub fn global_data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "stitchtrack")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Check if test mode is enabled.
///
/// Test mode is enabled by setting `ST_TEST_DB=1` (or any non-empty value).
/// This redirects all database operations to an isolated test database.
#[must_use]
pub fn is_test_mode() -> bool {
    std::env::var("ST_TEST_DB")
        .map(|v| !v.is_empty() && v != "0" && v.to_lowercase() != "false")
        .unwrap_or(false)
}

/// Get the test database path.
///
/// Returns `<data dir>/test/stitchtrack.db` for isolated testing.
#[must_use]
pub fn test_db_path() -> Option<PathBuf> {
    global_data_dir().map(|dir| dir.join("test").join("stitchtrack.db"))
}

/// Resolve the database path.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `ST_TEST_DB` environment variable → uses test database
/// 3. `ST_DB` environment variable
/// 4. Global location: `<data dir>/stitchtrack.db`
///
/// # Returns
///
/// Returns the path to the database file, or `None` if no location found.
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if is_test_mode() {
        return test_db_path();
    }

    if let Ok(db_path) = std::env::var("ST_DB") {
        if !db_path.trim().is_empty() {
            return Some(PathBuf::from(db_path));
        }
    }

    global_data_dir().map(|dir| dir.join("stitchtrack.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_db_path_with_explicit() {
        let explicit = PathBuf::from("/custom/path/db.sqlite");
        let result = resolve_db_path(Some(&explicit));
        assert_eq!(result, Some(explicit));
    }

    #[test]
    fn test_resolve_db_path_defaults_to_global() {
        let result = resolve_db_path(None);
        assert!(result.is_some());
        assert!(result.unwrap().ends_with("stitchtrack.db"));
    }

    #[test]
    fn test_test_db_path_is_separate() {
        let global = global_data_dir().unwrap();
        let test = test_db_path().unwrap();

        assert!(test.to_string_lossy().contains("/test/"));
        assert!(test.ends_with("stitchtrack.db"));
        assert_ne!(global.join("stitchtrack.db"), test);
    }
}

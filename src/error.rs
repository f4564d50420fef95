//! Error types for the stitchtrack CLI.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=db, 3=not_found, 4=validation, etc.)
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for stitchtrack operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    NotInitialized,
    AlreadyInitialized,
    DatabaseError,

    // Not Found (exit 3)
    ProjectNotFound,

    // Validation (exit 4)
    InvalidArgument,

    // Backup (exit 6)
    BackupFormat,
    StorageUnavailable,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::ProjectNotFound => "PROJECT_NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::BackupFormat => "BACKUP_FORMAT",
            Self::StorageUnavailable => "STORAGE_UNAVAILABLE",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized | Self::AlreadyInitialized | Self::DatabaseError => 2,
            Self::ProjectNotFound => 3,
            Self::InvalidArgument => 4,
            Self::BackupFormat | Self::StorageUnavailable => 6,
            Self::IoError | Self::JsonError => 8,
        }
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in stitchtrack CLI operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `st init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("Project not found: {id}")]
    ProjectNotFound { id: i64 },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid backup archive: {0}")]
    BackupFormat(String),

    #[error("No writable backup destination available")]
    StorageUnavailable,

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::ProjectNotFound { .. } => ErrorCode::ProjectNotFound,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::BackupFormat(_) => ErrorCode::BackupFormat,
            Self::StorageUnavailable => ErrorCode::StorageUnavailable,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => Some("Run `st init` to create the database".to_string()),

            Self::AlreadyInitialized { path } => Some(format!(
                "Database already exists at {}. Use `--force` to reinitialize.",
                path.display()
            )),

            Self::ProjectNotFound { id } => Some(format!(
                "No project with id {id}. Use `st project list` to see available projects."
            )),

            Self::BackupFormat(_) => {
                Some("The file is not a readable stitchtrack backup archive.".to_string())
            }

            Self::StorageUnavailable => Some(
                "No default backup location could be resolved. \
                 Pass an explicit path with `--output`."
                    .to_string(),
            ),

            Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::InvalidArgument(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, exit code, and optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

impl From<crate::backup::BackupError> for Error {
    fn from(err: crate::backup::BackupError) -> Self {
        use crate::backup::BackupError;
        match err {
            BackupError::Io(e) => Self::Io(e),
            BackupError::Format(msg) => Self::BackupFormat(msg),
            BackupError::Database(msg) => Self::Other(format!("Database error: {msg}")),
            BackupError::StorageUnavailable => Self::StorageUnavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_category() {
        assert_eq!(Error::NotInitialized.exit_code(), 2);
        assert_eq!(Error::ProjectNotFound { id: 7 }.exit_code(), 3);
        assert_eq!(Error::InvalidArgument("bad".into()).exit_code(), 4);
        assert_eq!(Error::BackupFormat("bad zip".into()).exit_code(), 6);
        assert_eq!(Error::StorageUnavailable.exit_code(), 6);
        assert_eq!(Error::Other("boom".into()).exit_code(), 1);
    }

    #[test]
    fn test_structured_json_includes_hint() {
        let err = Error::ProjectNotFound { id: 3 };
        let json = err.to_structured_json();
        assert_eq!(json["error"]["code"], "PROJECT_NOT_FOUND");
        assert_eq!(json["error"]["exit_code"], 3);
        assert!(json["error"]["hint"].as_str().unwrap().contains("st project list"));
    }

    #[test]
    fn test_backup_error_conversion() {
        let err: Error = crate::backup::BackupError::StorageUnavailable.into();
        assert!(matches!(err, Error::StorageUnavailable));

        let err: Error = crate::backup::BackupError::Format("truncated".into()).into();
        assert_eq!(err.error_code(), ErrorCode::BackupFormat);
    }
}

//! Backup and restore of the project library.
//!
//! A backup is a zip archive containing a `backup.json` manifest and the
//! images referenced by the exported projects. Export assembles the archive
//! in an ephemeral staging directory; import unpacks into one, then moves
//! records into the store and images into internal storage one project at a
//! time. A single bad project entry never aborts the rest of an import.
//!
//! # Submodules
//!
//! - [`manifest`] - manifest document codec
//! - [`staging`] - ephemeral working directories
//! - [`archive`] - zip pack/unpack
//! - [`images`] - image relocation and naming
//! - [`fs`] - injected filesystem capabilities
//! - [`export`] - export orchestrator
//! - [`import`] - import orchestrator

pub mod archive;
pub mod export;
pub mod fs;
pub mod images;
pub mod import;
pub mod manifest;
pub mod staging;

pub use export::Exporter;
pub use fs::{AppDirs, DirectoryLocator, FsStreams, StreamOpener};
pub use images::ImageRelocator;
pub use import::{ImportSummary, Importer};
pub use manifest::{BackupManifest, BackupMetadata, PortableProject, BACKUP_VERSION};
pub use staging::StagingDir;

/// Backup-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    /// Filesystem or stream failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed manifest or archive.
    #[error("Invalid backup archive: {0}")]
    Format(String),

    /// Project store failure.
    #[error("Database error: {0}")]
    Database(String),

    /// No writable destination could be resolved for the archive.
    #[error("No writable backup destination available")]
    StorageUnavailable,
}

impl From<rusqlite::Error> for BackupError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result type for backup operations.
pub type BackupResult<T> = std::result::Result<T, BackupError>;

//! Filesystem capabilities injected into the backup orchestrators.
//!
//! Two small traits decouple export/import from the host environment:
//! [`DirectoryLocator`] answers "where do staging, internal storage, and the
//! default export destination live", and [`StreamOpener`] opens the archive
//! endpoints. Tests substitute sandbox-rooted implementations.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use directories::{ProjectDirs, UserDirs};

use crate::error::{Error, Result};

/// Resolves the directories the backup subsystem works in.
pub trait DirectoryLocator {
    /// Parent directory for ephemeral staging areas.
    fn cache_dir(&self) -> PathBuf;

    /// Root of permanent internal storage (relocated images live under it).
    fn data_dir(&self) -> PathBuf;

    /// Default destination directory for exported archives, if the host has
    /// one. `None` means export must be given an explicit destination.
    fn export_dir(&self) -> Option<PathBuf>;
}

/// Opens archive input/output streams.
///
/// Returns `File` because the zip container needs seekable endpoints on
/// both sides.
pub trait StreamOpener {
    /// Open an existing archive for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be opened.
    fn open_input(&self, path: &Path) -> io::Result<File>;

    /// Create (or truncate) an archive for writing.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be created.
    fn open_output(&self, path: &Path) -> io::Result<File>;
}

/// Platform directories for the installed application.
#[derive(Debug, Clone)]
pub struct AppDirs {
    cache: PathBuf,
    data: PathBuf,
    export: Option<PathBuf>,
}

impl AppDirs {
    /// Resolve the standard platform directories.
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn resolve() -> Result<Self> {
        let dirs = ProjectDirs::from("", "", "stitchtrack")
            .ok_or_else(|| Error::Other("Could not determine home directory".to_string()))?;

        // Documents is the desktop analog of externally visible storage;
        // absent (headless setups) it simply disables the default export
        // destination rather than failing resolution.
        let export = UserDirs::new().and_then(|u| u.document_dir().map(Path::to_path_buf));

        Ok(Self {
            cache: dirs.cache_dir().to_path_buf(),
            data: dirs.data_dir().to_path_buf(),
            export,
        })
    }

    /// Build from explicit directories (used by tests and by `--db` style
    /// overrides that relocate the whole data root).
    #[must_use]
    pub fn from_parts(cache: PathBuf, data: PathBuf, export: Option<PathBuf>) -> Self {
        Self { cache, data, export }
    }
}

impl DirectoryLocator for AppDirs {
    fn cache_dir(&self) -> PathBuf {
        self.cache.clone()
    }

    fn data_dir(&self) -> PathBuf {
        self.data.clone()
    }

    fn export_dir(&self) -> Option<PathBuf> {
        self.export.clone()
    }
}

/// Plain filesystem stream opener.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStreams;

impl StreamOpener for FsStreams {
    fn open_input(&self, path: &Path) -> io::Result<File> {
        File::open(path)
    }

    fn open_output(&self, path: &Path) -> io::Result<File> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        File::create(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_parts_round_trips() {
        let dirs = AppDirs::from_parts(
            PathBuf::from("/tmp/cache"),
            PathBuf::from("/tmp/data"),
            None,
        );
        assert_eq!(dirs.cache_dir(), PathBuf::from("/tmp/cache"));
        assert_eq!(dirs.data_dir(), PathBuf::from("/tmp/data"));
        assert!(dirs.export_dir().is_none());
    }

    #[test]
    fn test_fs_streams_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a/b/out.zip");

        let file = FsStreams.open_output(&nested).unwrap();
        drop(file);
        assert!(nested.exists());

        assert!(FsStreams.open_input(&nested).is_ok());
        assert!(FsStreams.open_input(&temp.path().join("missing.zip")).is_err());
    }
}

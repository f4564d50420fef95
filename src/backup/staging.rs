//! Ephemeral staging directories for backup assembly and unpacking.
//!
//! Every export or import owns exactly one staging directory. The directory
//! is named with a millisecond timestamp (bumped on collision, so two
//! operations starting in the same instant never share one) and is removed
//! unconditionally when the operation ends: `cleanup` is idempotent and
//! Drop calls it, covering every error path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use crate::backup::manifest::IMAGES_DIR_NAME;
use crate::backup::BackupResult;

/// Staging directories older than this are considered orphaned leftovers
/// from a torn-down operation and may be swept.
const ORPHAN_AGE: Duration = Duration::from_secs(60 * 60);

/// An exclusively owned temporary working directory.
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    /// Allocate a fresh, uniquely named staging directory under `base`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn create(base: &Path, prefix: &str) -> BackupResult<Self> {
        fs::create_dir_all(base)?;

        let millis = chrono::Utc::now().timestamp_millis();
        let mut suffix = 0u32;
        loop {
            let name = if suffix == 0 {
                format!("{prefix}_{millis}")
            } else {
                format!("{prefix}_{millis}_{suffix}")
            };
            let candidate = base.join(name);
            match fs::create_dir(&candidate) {
                Ok(()) => {
                    debug!(path = %candidate.display(), "created staging directory");
                    return Ok(Self { path: candidate });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => suffix += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Path of the staging directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the image subdirectory (not necessarily created yet).
    #[must_use]
    pub fn images_dir(&self) -> PathBuf {
        self.path.join(IMAGES_DIR_NAME)
    }

    /// Recursively delete the staging directory.
    ///
    /// Never fails: a missing or partially deleted tree is fine, and any
    /// other error is logged and swallowed (staging lives under the cache
    /// directory, so leftovers are reclaimed by the orphan sweep).
    pub fn cleanup(&self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed staging directory"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), "staging cleanup failed: {e}"),
        }
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Best-effort removal of staging directories abandoned by a torn-down
/// process. Only directories matching `prefix` and older than an hour are
/// touched, so a concurrently running operation keeps its staging area.
pub fn sweep_orphans(base: &Path, prefix: &str) {
    let Ok(entries) = fs::read_dir(base) else {
        return;
    };

    let now = SystemTime::now();
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with(prefix) {
            continue;
        }

        let stale = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .is_some_and(|age| age > ORPHAN_AGE);

        if stale {
            let path = entry.path();
            if let Err(e) = fs::remove_dir_all(&path) {
                warn!(path = %path.display(), "orphan staging sweep failed: {e}");
            } else {
                debug!(path = %path.display(), "swept orphaned staging directory");
            }
        }
    }
}

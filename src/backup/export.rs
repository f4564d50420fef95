//! Backup export orchestration.
//!
//! Export takes one snapshot of the project store, stages a manifest plus
//! every still-existing referenced image, packs the staging directory into
//! a zip, and hands back the archive location. Project records are never
//! mutated; a missing image file is skipped, not an error.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::backup::archive::pack_directory;
use crate::backup::fs::{DirectoryLocator, StreamOpener};
use crate::backup::images::staged_image_name;
use crate::backup::manifest::{
    self, BackupManifest, BackupMetadata, PortableProject, BACKUP_VERSION, MANIFEST_FILE_NAME,
};
use crate::backup::staging::{self, StagingDir};
use crate::backup::{BackupError, BackupResult};
use crate::model::Project;
use crate::storage::SqliteStorage;

/// Staging directory prefix shared by export and import, so the orphan
/// sweep covers both.
pub(crate) const STAGING_PREFIX: &str = "backup";

/// Exporter for backup archives.
pub struct Exporter<'a> {
    storage: &'a SqliteStorage,
    dirs: &'a dyn DirectoryLocator,
    streams: &'a dyn StreamOpener,
    app_version: String,
}

impl<'a> Exporter<'a> {
    /// Create an exporter over the store and host environment.
    #[must_use]
    pub fn new(
        storage: &'a SqliteStorage,
        dirs: &'a dyn DirectoryLocator,
        streams: &'a dyn StreamOpener,
        app_version: &str,
    ) -> Self {
        Self {
            storage,
            dirs,
            streams,
            app_version: app_version.to_string(),
        }
    }

    /// Export the whole library to a backup archive.
    ///
    /// Writes to `destination` when given, otherwise to a timestamped file
    /// in the host's default export directory.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` when no destination is resolvable,
    /// `Database` if the snapshot read fails, and `Io`/`Format` for
    /// filesystem or archive failures.
    pub fn export(&self, destination: Option<&Path>) -> BackupResult<PathBuf> {
        staging::sweep_orphans(&self.dirs.cache_dir(), STAGING_PREFIX);

        // One consistent snapshot; concurrent store writes after this point
        // are intentionally not observed.
        let projects = self.storage.list_projects().map_err(|e| BackupError::Database(e.to_string()))?;

        let now = Utc::now();
        let manifest = BackupManifest {
            metadata: BackupMetadata {
                version: BACKUP_VERSION,
                export_date: now.timestamp_millis(),
                app_version: self.app_version.clone(),
                project_count: i32::try_from(projects.len()).unwrap_or(i32::MAX),
            },
            projects: projects.iter().map(to_portable).collect(),
        };

        let dest_path = match destination {
            Some(path) => path.to_path_buf(),
            None => {
                let dir = self
                    .dirs
                    .export_dir()
                    .ok_or(BackupError::StorageUnavailable)?;
                dir.join(format!(
                    "stitchtrack_backup_{}.zip",
                    now.format("%Y%m%d_%H%M%S")
                ))
            }
        };

        let staging = StagingDir::create(&self.dirs.cache_dir(), STAGING_PREFIX)?;
        fs::write(
            staging.path().join(MANIFEST_FILE_NAME),
            manifest::encode(&manifest)?,
        )?;

        let images_dir = staging.images_dir();
        fs::create_dir_all(&images_dir)?;
        for project in &projects {
            for (index, path) in project.image_paths.iter().enumerate() {
                let source = Path::new(path);
                if source.is_file() {
                    let staged = images_dir.join(staged_image_name(project.id, index, source));
                    fs::copy(source, staged)?;
                } else {
                    warn!(project = project.id, image = %path, "skipping missing image during export");
                }
            }
        }

        let file = self.streams.open_output(&dest_path)?;
        pack_directory(staging.path(), file)?;
        debug!(archive = %dest_path.display(), "packed backup archive");

        info!(
            projects = projects.len(),
            archive = %dest_path.display(),
            "export complete"
        );
        Ok(dest_path)
        // `staging` drops here, deleting the working directory on every path.
    }
}

fn to_portable(project: &Project) -> PortableProject {
    PortableProject {
        id: project.id,
        kind: project.kind.token().to_string(),
        title: project.title.clone(),
        stitch_counter_number: project.stitch_count,
        stitch_adjustment: project.stitch_step,
        row_counter_number: project.row_count,
        row_adjustment: project.row_step,
        total_rows: project.total_rows,
        // Still the exporter's absolute paths; archive-relative naming is
        // applied to the staged copies, not the manifest.
        image_paths: project.image_paths.clone(),
    }
}

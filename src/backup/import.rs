//! Backup import orchestration.
//!
//! Import unpacks the archive into staging, decodes the manifest, then
//! walks the project entries one at a time: stage-named images are located
//! (with a legacy basename fallback), relocated into internal storage, and
//! the record is upserted. Each entry is attempted independently: one
//! corrupt record is reported in the summary, never aborting the batch.
//! Only a failure to unpack or decode fails the operation as a whole.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::backup::archive::unpack_archive;
use crate::backup::export::STAGING_PREFIX;
use crate::backup::fs::{DirectoryLocator, StreamOpener};
use crate::backup::images::{staged_image_name, ImageRelocator};
use crate::backup::manifest::{self, PortableProject, BACKUP_VERSION, MANIFEST_FILE_NAME};
use crate::backup::staging::{self, StagingDir};
use crate::backup::{BackupError, BackupResult};
use crate::model::{Project, ProjectKind, UNASSIGNED_ID};
use crate::storage::SqliteStorage;

/// Outcome of an import: per-record successes and failures.
///
/// A non-empty `failed_projects` list is not an operation failure; the
/// caller decides whether to warn the user about the partial result.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ImportSummary {
    /// Number of records imported successfully.
    pub imported: usize,
    /// Number of records that failed.
    pub failed: usize,
    /// Labels ("title (ID: n)") of the failed records.
    pub failed_projects: Vec<String>,
}

/// Importer for backup archives.
pub struct Importer<'a> {
    storage: &'a mut SqliteStorage,
    dirs: &'a dyn DirectoryLocator,
    streams: &'a dyn StreamOpener,
}

impl<'a> Importer<'a> {
    /// Create an importer over the store and host environment.
    #[must_use]
    pub fn new(
        storage: &'a mut SqliteStorage,
        dirs: &'a dyn DirectoryLocator,
        streams: &'a dyn StreamOpener,
    ) -> Self {
        Self {
            storage,
            dirs,
            streams,
        }
    }

    /// Restore projects from a backup archive.
    ///
    /// With `replace_existing`, records keep the ids carried in the archive
    /// (overwriting store rows with those ids); otherwise every record gets
    /// a freshly assigned id.
    ///
    /// # Errors
    ///
    /// Returns `Format` if the archive cannot be unpacked or carries no
    /// decodable manifest, `Io` on filesystem failures. Per-record problems
    /// are reported through the summary instead.
    pub fn import(&mut self, source: &Path, replace_existing: bool) -> BackupResult<ImportSummary> {
        staging::sweep_orphans(&self.dirs.cache_dir(), STAGING_PREFIX);

        let staging = StagingDir::create(&self.dirs.cache_dir(), STAGING_PREFIX)?;
        let input = self.streams.open_input(source)?;
        unpack_archive(input, staging.path())?;

        let manifest_path = staging.path().join(MANIFEST_FILE_NAME);
        if !manifest_path.exists() {
            return Err(BackupError::Format(format!(
                "{MANIFEST_FILE_NAME} not found in archive"
            )));
        }
        let doc = manifest::decode(&fs::read_to_string(&manifest_path)?)?;

        if doc.metadata.version != BACKUP_VERSION {
            warn!(
                version = doc.metadata.version,
                "manifest version differs from {BACKUP_VERSION}, importing anyway"
            );
        }
        // Informational only: the entry list is authoritative.
        if doc.metadata.project_count as usize != doc.projects.len() {
            warn!(
                declared = doc.metadata.project_count,
                actual = doc.projects.len(),
                "manifest project count mismatch"
            );
        }

        let images_dir = staging.images_dir();
        let relocator = ImageRelocator::new(self.dirs);
        let mut summary = ImportSummary::default();

        for entry in &doc.projects {
            match self.import_record(entry, &images_dir, &relocator, replace_existing) {
                Ok(id) => {
                    debug!(id, "imported project");
                    summary.imported += 1;
                }
                Err(e) => {
                    let label = manifest::project_label(entry);
                    warn!(record = %label, "record failed, continuing: {e}");
                    summary.failed += 1;
                    summary.failed_projects.push(label);
                }
            }
        }

        info!(
            imported = summary.imported,
            failed = summary.failed,
            "import complete"
        );
        Ok(summary)
        // `staging` drops here, deleting the working directory on every path.
    }

    /// Import one record: parse, gather images, upsert. Any failure here
    /// fails this record alone.
    fn import_record(
        &mut self,
        entry: &Value,
        images_dir: &Path,
        relocator: &ImageRelocator<'_>,
        replace_existing: bool,
    ) -> BackupResult<i64> {
        let record: PortableProject = serde_json::from_value(entry.clone())
            .map_err(|e| BackupError::Format(e.to_string()))?;

        let mut image_paths = Vec::new();
        for (index, path) in record.image_paths.iter().enumerate() {
            let original = Path::new(path);
            let staged = images_dir.join(staged_image_name(record.id, index, original));

            // Older archives named entries by bare file name only. That
            // lookup can associate the wrong file when two projects share a
            // base name; kept as-is for compatibility.
            let candidate = if staged.exists() {
                Some(staged)
            } else {
                original
                    .file_name()
                    .map(|name| images_dir.join(name))
                    .filter(|fallback| fallback.exists())
            };

            match candidate {
                Some(found) => {
                    if let Some(relocated) = relocator.relocate(&found, record.id, index) {
                        image_paths.push(relocated.to_string_lossy().into_owned());
                    }
                }
                None => {
                    warn!(
                        project = record.id,
                        image = %path,
                        "image not present in archive, dropping"
                    );
                }
            }
        }

        let project = Project {
            id: if replace_existing {
                record.id
            } else {
                UNASSIGNED_ID
            },
            kind: ProjectKind::from_token(&record.kind),
            title: record.title,
            stitch_count: record.stitch_counter_number,
            stitch_step: record.stitch_adjustment,
            row_count: record.row_counter_number,
            row_step: record.row_adjustment,
            total_rows: record.total_rows,
            image_paths,
        };

        self.storage
            .upsert_project(&project)
            .map_err(|e| BackupError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::archive::pack_directory;
    use crate::backup::export::Exporter;
    use crate::backup::fs::{AppDirs, FsStreams};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn locator(root: &Path) -> AppDirs {
        AppDirs::from_parts(root.join("cache"), root.join("data"), None)
    }

    fn seed_project(
        storage: &mut SqliteStorage,
        title: &str,
        images: Vec<String>,
    ) -> Project {
        let mut project = Project::new(title.to_string(), ProjectKind::Double);
        project.stitch_count = 33;
        project.stitch_step = 3;
        project.row_count = 8;
        project.row_step = 2;
        project.total_rows = 64;
        project.image_paths = images;
        let id = storage.upsert_project(&project).unwrap();
        project.id = id;
        project
    }

    /// Build an archive by staging `files` (relative name -> bytes) and packing.
    fn build_archive(root: &Path, files: &[(&str, &[u8])]) -> PathBuf {
        let stage = root.join("handmade_stage");
        for (name, bytes) in files {
            let dest = stage.join(name);
            fs::create_dir_all(dest.parent().unwrap()).unwrap();
            fs::write(dest, bytes).unwrap();
        }
        let archive = root.join("handmade.zip");
        pack_directory(&stage, fs::File::create(&archive).unwrap()).unwrap();
        fs::remove_dir_all(stage).unwrap();
        archive
    }

    fn export_library(storage: &SqliteStorage, root: &Path) -> PathBuf {
        let dirs = locator(root);
        let out = root.join("export.zip");
        Exporter::new(storage, &dirs, &FsStreams, "0.1.0")
            .export(Some(&out))
            .unwrap();
        out
    }

    #[test]
    fn test_round_trip_fresh_import() {
        let source_env = TempDir::new().unwrap();
        let image = source_env.path().join("scarf.jpg");
        fs::write(&image, b"jpeg-original").unwrap();

        let mut source_store = SqliteStorage::open_memory().unwrap();
        let exported = seed_project(
            &mut source_store,
            "Winter Scarf",
            vec![image.to_string_lossy().into_owned()],
        );
        let archive = export_library(&source_store, source_env.path());

        let dest_env = TempDir::new().unwrap();
        let dirs = locator(dest_env.path());
        let mut dest_store = SqliteStorage::open_memory().unwrap();
        let summary = Importer::new(&mut dest_store, &dirs, &FsStreams)
            .import(&archive, false)
            .unwrap();

        assert_eq!(summary.imported, 1);
        assert_eq!(summary.failed, 0);

        let restored = &dest_store.list_projects().unwrap()[0];
        assert_eq!(restored.title, exported.title);
        assert_eq!(restored.kind, exported.kind);
        assert_eq!(restored.stitch_count, exported.stitch_count);
        assert_eq!(restored.stitch_step, exported.stitch_step);
        assert_eq!(restored.row_count, exported.row_count);
        assert_eq!(restored.row_step, exported.row_step);
        assert_eq!(restored.total_rows, exported.total_rows);

        // Image relocated into the destination's internal storage, bytes intact.
        assert_eq!(restored.image_paths.len(), 1);
        let relocated = Path::new(&restored.image_paths[0]);
        assert!(relocated.starts_with(dest_env.path().join("data")));
        assert_eq!(fs::read(relocated).unwrap(), b"jpeg-original");
    }

    #[test]
    fn test_replace_existing_preserves_ids() {
        let env = TempDir::new().unwrap();
        let mut source_store = SqliteStorage::open_memory().unwrap();
        let original = seed_project(&mut source_store, "Original Hat", vec![]);
        let archive = export_library(&source_store, env.path());

        // Destination already has a different project under that id.
        let mut dest_store = SqliteStorage::open_memory().unwrap();
        let squatter = seed_project(&mut dest_store, "Squatter", vec![]);
        assert_eq!(squatter.id, original.id);

        let dirs = locator(env.path());
        let summary = Importer::new(&mut dest_store, &dirs, &FsStreams)
            .import(&archive, true)
            .unwrap();
        assert_eq!(summary.imported, 1);

        let restored = dest_store.get_project(original.id).unwrap().unwrap();
        assert_eq!(restored.title, "Original Hat");
        assert_eq!(dest_store.list_projects().unwrap().len(), 1);
    }

    #[test]
    fn test_fresh_import_assigns_new_ids() {
        let env = TempDir::new().unwrap();
        let mut source_store = SqliteStorage::open_memory().unwrap();
        let original = seed_project(&mut source_store, "Original Hat", vec![]);
        let archive = export_library(&source_store, env.path());

        let mut dest_store = SqliteStorage::open_memory().unwrap();
        seed_project(&mut dest_store, "Keeper", vec![]);

        let dirs = locator(env.path());
        Importer::new(&mut dest_store, &dirs, &FsStreams)
            .import(&archive, false)
            .unwrap();

        let projects = dest_store.list_projects().unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].title, "Keeper");
        assert_eq!(projects[1].title, "Original Hat");
        assert_ne!(projects[1].id, original.id);
    }

    #[test]
    fn test_malformed_record_fails_alone() {
        let env = TempDir::new().unwrap();
        let manifest_text = r#"{
            "metadata": {"version": 1, "export_date": 5, "app_version": "0.1.0", "project_count": 3},
            "projects": [
                {"id": 1, "type": "single", "title": "First", "stitch_counter_number": 1,
                 "stitch_adjustment": 1, "row_counter_number": 0, "row_adjustment": 1,
                 "total_rows": 0, "image_paths": []},
                {"id": 2, "title": "Broken Cardigan", "stitch_counter_number": "not a number"},
                {"id": 3, "type": "double", "title": "Third", "stitch_counter_number": 9,
                 "stitch_adjustment": 1, "row_counter_number": 2, "row_adjustment": 1,
                 "total_rows": 10, "image_paths": []}
            ]
        }"#;
        let archive = build_archive(env.path(), &[("backup.json", manifest_text.as_bytes())]);

        let dirs = locator(env.path());
        let mut store = SqliteStorage::open_memory().unwrap();
        let summary = Importer::new(&mut store, &dirs, &FsStreams)
            .import(&archive, false)
            .unwrap();

        assert_eq!(summary.imported, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failed_projects, vec!["Broken Cardigan (ID: 2)"]);

        let titles: Vec<_> = store
            .list_projects()
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["First", "Third"]);
    }

    #[test]
    fn test_missing_manifest_is_format_error() {
        let env = TempDir::new().unwrap();
        let archive = build_archive(env.path(), &[("images/stray.jpg", b"jpeg")]);

        let dirs = locator(env.path());
        let mut store = SqliteStorage::open_memory().unwrap();
        let result = Importer::new(&mut store, &dirs, &FsStreams).import(&archive, false);
        assert!(matches!(result, Err(BackupError::Format(_))));

        // Staging must be gone even on the failure path.
        let leftovers: Vec<_> = fs::read_dir(env.path().join("cache"))
            .unwrap()
            .flatten()
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_basename_fallback_finds_legacy_entries() {
        let env = TempDir::new().unwrap();
        let manifest_text = r#"{
            "metadata": {"version": 1, "export_date": 5, "app_version": "0.1.0", "project_count": 1},
            "projects": [
                {"id": 4, "type": "single", "title": "Legacy", "stitch_counter_number": 0,
                 "stitch_adjustment": 1, "row_counter_number": 0, "row_adjustment": 1,
                 "total_rows": 0, "image_paths": ["/old/device/photo.jpg"]}
            ]
        }"#;
        // Entry named by bare base name, not project_4_0_photo.jpg.
        let archive = build_archive(
            env.path(),
            &[
                ("backup.json", manifest_text.as_bytes()),
                ("images/photo.jpg", b"legacy-bytes"),
            ],
        );

        let dirs = locator(env.path());
        let mut store = SqliteStorage::open_memory().unwrap();
        let summary = Importer::new(&mut store, &dirs, &FsStreams)
            .import(&archive, false)
            .unwrap();
        assert_eq!(summary.imported, 1);

        let restored = &store.list_projects().unwrap()[0];
        assert_eq!(restored.image_paths.len(), 1);
        assert_eq!(fs::read(&restored.image_paths[0]).unwrap(), b"legacy-bytes");
    }

    #[test]
    fn test_fallback_by_basename_can_misassociate_across_projects() {
        // Known collision risk, kept for compatibility: two projects whose
        // source paths share a base name both match the same legacy entry.
        let env = TempDir::new().unwrap();
        let manifest_text = r#"{
            "metadata": {"version": 1, "export_date": 5, "app_version": "0.1.0", "project_count": 2},
            "projects": [
                {"id": 1, "type": "single", "title": "Mine", "stitch_counter_number": 0,
                 "stitch_adjustment": 1, "row_counter_number": 0, "row_adjustment": 1,
                 "total_rows": 0, "image_paths": ["/alpha/photo.jpg"]},
                {"id": 2, "type": "single", "title": "Yours", "stitch_counter_number": 0,
                 "stitch_adjustment": 1, "row_counter_number": 0, "row_adjustment": 1,
                 "total_rows": 0, "image_paths": ["/beta/photo.jpg"]}
            ]
        }"#;
        let archive = build_archive(
            env.path(),
            &[
                ("backup.json", manifest_text.as_bytes()),
                ("images/photo.jpg", b"whose-is-this"),
            ],
        );

        let dirs = locator(env.path());
        let mut store = SqliteStorage::open_memory().unwrap();
        let summary = Importer::new(&mut store, &dirs, &FsStreams)
            .import(&archive, false)
            .unwrap();
        assert_eq!(summary.imported, 2);

        let projects = store.list_projects().unwrap();
        // Both records resolved the same archive entry.
        assert_eq!(projects[0].image_paths.len(), 1);
        assert_eq!(projects[1].image_paths.len(), 1);
        assert_eq!(
            fs::read(&projects[0].image_paths[0]).unwrap(),
            fs::read(&projects[1].image_paths[0]).unwrap()
        );
    }

    #[test]
    fn test_absent_image_is_dropped_record_still_imports() {
        let env = TempDir::new().unwrap();
        let manifest_text = r#"{
            "metadata": {"version": 1, "export_date": 5, "app_version": "0.1.0", "project_count": 1},
            "projects": [
                {"id": 6, "type": "double", "title": "No Photos", "stitch_counter_number": 5,
                 "stitch_adjustment": 1, "row_counter_number": 1, "row_adjustment": 1,
                 "total_rows": 20, "image_paths": ["/gone/forever.jpg"]}
            ]
        }"#;
        let archive = build_archive(env.path(), &[("backup.json", manifest_text.as_bytes())]);

        let dirs = locator(env.path());
        let mut store = SqliteStorage::open_memory().unwrap();
        let summary = Importer::new(&mut store, &dirs, &FsStreams)
            .import(&archive, false)
            .unwrap();

        assert_eq!(summary.imported, 1);
        assert_eq!(summary.failed, 0);
        let restored = &store.list_projects().unwrap()[0];
        assert_eq!(restored.title, "No Photos");
        assert!(restored.image_paths.is_empty());
    }

    #[test]
    fn test_project_count_mismatch_is_informational() {
        let env = TempDir::new().unwrap();
        let manifest_text = r#"{
            "metadata": {"version": 1, "export_date": 5, "app_version": "0.1.0", "project_count": 99},
            "projects": [
                {"id": 1, "type": "single", "title": "Only One", "stitch_counter_number": 0,
                 "stitch_adjustment": 1, "row_counter_number": 0, "row_adjustment": 1,
                 "total_rows": 0, "image_paths": []}
            ]
        }"#;
        let archive = build_archive(env.path(), &[("backup.json", manifest_text.as_bytes())]);

        let dirs = locator(env.path());
        let mut store = SqliteStorage::open_memory().unwrap();
        let summary = Importer::new(&mut store, &dirs, &FsStreams)
            .import(&archive, false)
            .unwrap();
        assert_eq!(summary.imported, 1);
    }
}

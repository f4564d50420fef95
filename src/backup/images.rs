//! Image naming and relocation.
//!
//! Two naming schemes meet here. Inside an archive, an image is named after
//! the project id, its position in that project's image list, and the
//! original file name, so export and import derive the same entry name
//! independently. In internal storage, a relocated image gets a fresh
//! timestamped name so repeated imports never collide.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::backup::fs::DirectoryLocator;

/// Subdirectory of internal storage holding project images.
pub const INTERNAL_IMAGES_DIR: &str = "project_images";

/// Archive entry base name for one image: `project_<id>_<index>_<original>`.
///
/// `index` is the position of the path within the project's image list and
/// must round-trip for import to find the entry again.
#[must_use]
pub fn staged_image_name(project_id: i64, index: usize, source: &Path) -> String {
    let base = source
        .file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
    format!("project_{project_id}_{index}_{base}")
}

/// Copies images into permanent internal storage.
pub struct ImageRelocator<'a> {
    locator: &'a dyn DirectoryLocator,
}

impl<'a> ImageRelocator<'a> {
    /// Create a relocator over the host's directories.
    #[must_use]
    pub fn new(locator: &'a dyn DirectoryLocator) -> Self {
        Self { locator }
    }

    /// Directory images are relocated into.
    #[must_use]
    pub fn images_dir(&self) -> PathBuf {
        self.locator.data_dir().join(INTERNAL_IMAGES_DIR)
    }

    /// Copy `source` into internal storage under a collision-free name.
    ///
    /// Returns the new permanent path, or `None` if the copy failed for any
    /// reason. A `None` means "image dropped", never "operation failed";
    /// the caller keeps going without this image.
    #[must_use]
    pub fn relocate(&self, source: &Path, project_id: i64, index: usize) -> Option<PathBuf> {
        let images_dir = self.images_dir();
        if let Err(e) = fs::create_dir_all(&images_dir) {
            warn!(dir = %images_dir.display(), "could not create image directory: {e}");
            return None;
        }

        let millis = chrono::Utc::now().timestamp_millis();
        let file_name = format!("project_{project_id}_{millis}_{index}.jpg");
        let dest = images_dir.join(file_name);

        match fs::copy(source, &dest) {
            Ok(_) => Some(dest),
            Err(e) => {
                warn!(
                    source = %source.display(),
                    "dropping image, copy failed: {e}"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::fs::AppDirs;
    use tempfile::TempDir;

    fn temp_locator(root: &Path) -> AppDirs {
        AppDirs::from_parts(root.join("cache"), root.join("data"), None)
    }

    #[test]
    fn test_staged_image_name() {
        assert_eq!(
            staged_image_name(3, 0, Path::new("/device/photos/scarf.jpg")),
            "project_3_0_scarf.jpg"
        );
        assert_eq!(
            staged_image_name(12, 4, Path::new("plain.png")),
            "project_12_4_plain.png"
        );
    }

    #[test]
    fn test_relocate_copies_into_internal_storage() {
        let temp = TempDir::new().unwrap();
        let locator = temp_locator(temp.path());
        let source = temp.path().join("incoming.jpg");
        fs::write(&source, b"jpeg-bytes").unwrap();

        let relocator = ImageRelocator::new(&locator);
        let dest = relocator.relocate(&source, 5, 1).unwrap();

        assert!(dest.starts_with(relocator.images_dir()));
        let name = dest.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("project_5_"));
        assert!(name.ends_with("_1.jpg"));
        assert_eq!(fs::read(&dest).unwrap(), b"jpeg-bytes");
    }

    #[test]
    fn test_relocate_missing_source_is_dropped() {
        let temp = TempDir::new().unwrap();
        let locator = temp_locator(temp.path());

        let relocator = ImageRelocator::new(&locator);
        assert!(relocator
            .relocate(&temp.path().join("nope.jpg"), 5, 0)
            .is_none());
    }

    #[test]
    fn test_relocated_names_do_not_collide_across_indices() {
        let temp = TempDir::new().unwrap();
        let locator = temp_locator(temp.path());
        let source = temp.path().join("img.jpg");
        fs::write(&source, b"x").unwrap();

        let relocator = ImageRelocator::new(&locator);
        let a = relocator.relocate(&source, 9, 0).unwrap();
        let b = relocator.relocate(&source, 9, 1).unwrap();
        assert_ne!(a, b);
    }
}

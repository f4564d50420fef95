//! Zip packing and unpacking of staging directories.
//!
//! Entry names are paths relative to the staged root with `/` separators,
//! so archives round-trip across platforms. Unpacking refuses entries that
//! would escape the destination (zip-slip) and reports corrupt or truncated
//! streams as format errors instead of leaving a silently partial tree
//! behind as success.

use std::fs::{self, File};
use std::io::{self, Read, Seek, Write};
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::backup::{BackupError, BackupResult};

fn zip_err(e: ZipError) -> BackupError {
    match e {
        ZipError::Io(io_err) => BackupError::Io(io_err),
        other => BackupError::Format(other.to_string()),
    }
}

/// Pack every regular file under `source_dir` into a compressed archive.
///
/// # Errors
///
/// Returns `Io` on read/write failures and `Format` if the archive stream
/// cannot be assembled.
pub fn pack_directory<W: Write + Seek>(source_dir: &Path, writer: W) -> BackupResult<()> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default();

    for entry in WalkDir::new(source_dir) {
        let entry = entry.map_err(|e| BackupError::Format(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|e| BackupError::Format(e.to_string()))?;
        let name = relative.to_string_lossy().replace('\\', "/");

        zip.start_file(&name, options).map_err(zip_err)?;
        let mut file = File::open(entry.path())?;
        io::copy(&mut file, &mut zip)?;
        debug!(entry = %name, "packed archive entry");
    }

    zip.finish().map_err(zip_err)?;
    Ok(())
}

/// Unpack a compressed archive into `dest_dir`, recreating the tree.
///
/// # Errors
///
/// Returns `Format` on a corrupt or truncated stream, or on an entry whose
/// name escapes `dest_dir`; `Io` on filesystem failures.
pub fn unpack_archive<R: Read + Seek>(reader: R, dest_dir: &Path) -> BackupResult<()> {
    let mut archive = ZipArchive::new(reader).map_err(zip_err)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(zip_err)?;

        let Some(relative) = entry.enclosed_name() else {
            return Err(BackupError::Format(format!(
                "archive entry escapes destination: {}",
                entry.name()
            )));
        };
        let dest = dest_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&dest)?;
        } else {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&dest)?;
            io::copy(&mut entry, &mut out)?;
        }
    }

    Ok(())
}

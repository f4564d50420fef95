//! Backup command implementations (archive export/import).
//!
//! These are thin shells over the orchestrators in [`crate::backup`]:
//! resolve the store and platform directories, run the operation, and
//! render the result. `BackupError` is converted into the crate error at
//! this boundary.

use crate::backup::{AppDirs, Exporter, FsStreams, ImportSummary, Importer};
use crate::cli::BackupCommands;
use crate::error::{Error, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Execute backup commands.
pub fn execute(command: &BackupCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    match command {
        BackupCommands::Export { output } => export(output.as_deref(), db_path, json),
        BackupCommands::Import { file, replace } => import(file, *replace, db_path, json),
    }
}

fn export(output: Option<&Path>, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let storage = super::open_storage(db_path)?;
    let dirs = AppDirs::resolve()?;

    let exporter = Exporter::new(&storage, &dirs, &FsStreams, env!("CARGO_PKG_VERSION"));
    let archive = exporter.export(output).map_err(Error::from)?;

    if json {
        let payload = serde_json::json!({
            "success": true,
            "archive": archive.display().to_string(),
        });
        println!("{payload}");
    } else {
        println!("{} Backup written", "✓".green());
        println!("  Archive: {}", archive.display());
    }
    Ok(())
}

fn import(file: &Path, replace: bool, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    if !file.exists() {
        return Err(Error::InvalidArgument(format!(
            "backup file not found: {}",
            file.display()
        )));
    }

    let mut storage = super::open_storage(db_path)?;
    let dirs = AppDirs::resolve()?;

    let summary = Importer::new(&mut storage, &dirs, &FsStreams)
        .import(file, replace)
        .map_err(Error::from)?;

    if json {
        let payload = serde_json::json!({
            "success": true,
            "summary": summary,
        });
        println!("{payload}");
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &ImportSummary) {
    if summary.failed == 0 {
        println!(
            "{} Import complete: {} project(s) restored",
            "✓".green(),
            summary.imported
        );
        return;
    }

    println!(
        "{} Import finished with errors: {} restored, {} failed",
        "!".yellow(),
        summary.imported,
        summary.failed
    );
    for label in &summary.failed_projects {
        println!("  {} {label}", "failed:".red());
    }
}

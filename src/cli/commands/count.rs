//! Counter adjustment command.
//!
//! `st count <id> <stitch|row> [--down]` moves the chosen counter by the
//! project's step size. Counters never go below zero; the row counter only
//! exists on double projects.

use crate::cli::Counter;
use crate::error::{Error, Result};
use crate::model::ProjectKind;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct CountOutput {
    id: i64,
    stitch_count: i32,
    row_count: i32,
}

/// Execute the count command.
pub fn execute(
    id: i64,
    counter: Counter,
    down: bool,
    db_path: Option<&PathBuf>,
    json: bool,
) -> Result<()> {
    let mut storage = super::open_storage(db_path)?;

    let project = storage
        .get_project(id)?
        .ok_or(Error::ProjectNotFound { id })?;

    if counter == Counter::Row && project.kind == ProjectKind::Single {
        return Err(Error::InvalidArgument(
            "row counter is only available on double projects".to_string(),
        ));
    }

    let (mut stitch, mut row) = (project.stitch_count, project.row_count);
    match counter {
        Counter::Stitch => stitch = adjust(stitch, project.stitch_step, down),
        Counter::Row => row = adjust(row, project.row_step, down),
    }

    storage.set_counts(id, stitch, row)?;

    if json {
        let output = CountOutput {
            id,
            stitch_count: stitch,
            row_count: row,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        match project.kind {
            ProjectKind::Single => println!("{}: {stitch}", project.title),
            ProjectKind::Double => {
                if project.total_rows > 0 {
                    println!(
                        "{}: {stitch} stitches, row {row} of {}",
                        project.title, project.total_rows
                    );
                } else {
                    println!("{}: {stitch} stitches, row {row}", project.title);
                }
            }
        }
    }
    Ok(())
}

/// Apply one step in either direction, clamped at zero.
fn adjust(current: i32, step: i32, down: bool) -> i32 {
    if down {
        (current - step).max(0)
    } else {
        current.saturating_add(step)
    }
}

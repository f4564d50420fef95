//! Project management commands.
//!
//! - `st project add <title>` - Create a new project
//! - `st project list` - List all projects
//! - `st project show <id>` - Show project details
//! - `st project delete <id>` - Delete a project
//! - `st project attach-image <id> <path>` - Attach an image to a project

use crate::backup::{AppDirs, ImageRelocator};
use crate::cli::{ProjectAddArgs, ProjectCommands};
use crate::error::{Error, Result};
use crate::model::Project;
use crate::storage::SqliteStorage;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct ProjectOutput {
    id: i64,
    kind: String,
    title: String,
    stitch_count: i32,
    stitch_step: i32,
    row_count: i32,
    row_step: i32,
    total_rows: i32,
    image_paths: Vec<String>,
}

impl From<Project> for ProjectOutput {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            kind: p.kind.token().to_string(),
            title: p.title,
            stitch_count: p.stitch_count,
            stitch_step: p.stitch_step,
            row_count: p.row_count,
            row_step: p.row_step,
            total_rows: p.total_rows,
            image_paths: p.image_paths,
        }
    }
}

#[derive(Serialize)]
struct ProjectListOutput {
    projects: Vec<ProjectOutput>,
    count: usize,
}

/// Execute a project command.
pub fn execute(command: &ProjectCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let mut storage = super::open_storage(db_path)?;

    match command {
        ProjectCommands::Add(args) => execute_add(&mut storage, args, json),
        ProjectCommands::List => execute_list(&storage, json),
        ProjectCommands::Show { id } => execute_show(&storage, *id, json),
        ProjectCommands::Delete { id } => execute_delete(&mut storage, *id, json),
        ProjectCommands::AttachImage { id, path } => {
            execute_attach_image(&mut storage, *id, path, json)
        }
    }
}

fn execute_add(storage: &mut SqliteStorage, args: &ProjectAddArgs, json: bool) -> Result<()> {
    if args.title.trim().is_empty() {
        return Err(Error::InvalidArgument("title must not be empty".to_string()));
    }
    if args.stitch_step < 1 || args.row_step < 1 {
        return Err(Error::InvalidArgument(
            "step sizes must be at least 1".to_string(),
        ));
    }

    let mut project = Project::new(args.title.clone(), args.kind.into());
    project.stitch_step = args.stitch_step;
    project.row_step = args.row_step;
    project.total_rows = args.total_rows;

    let id = storage.upsert_project(&project)?;
    project.id = id;

    if json {
        println!("{}", serde_json::to_string(&ProjectOutput::from(project))?);
    } else {
        println!("Created project '{}' (ID: {id})", args.title);
    }
    Ok(())
}

fn execute_list(storage: &SqliteStorage, json: bool) -> Result<()> {
    let projects = storage.list_projects()?;

    if json {
        let output = ProjectListOutput {
            count: projects.len(),
            projects: projects.into_iter().map(ProjectOutput::from).collect(),
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if projects.is_empty() {
        println!("No projects. Create one with 'st project add <title>'.");
        return Ok(());
    }

    for project in &projects {
        println!(
            "{:>4}  {:<8} {}",
            project.id,
            project.kind.token(),
            project.title
        );
    }
    println!();
    println!("{} project(s)", projects.len());
    Ok(())
}

fn execute_show(storage: &SqliteStorage, id: i64, json: bool) -> Result<()> {
    let project = storage
        .get_project(id)?
        .ok_or(Error::ProjectNotFound { id })?;

    if json {
        println!("{}", serde_json::to_string(&ProjectOutput::from(project))?);
        return Ok(());
    }

    println!("{} (ID: {})", project.title, project.id);
    println!("  Kind:     {}", project.kind);
    println!(
        "  Stitches: {} (step {})",
        project.stitch_count, project.stitch_step
    );
    println!("  Rows:     {} (step {})", project.row_count, project.row_step);
    if project.total_rows > 0 {
        println!("  Target:   {} rows", project.total_rows);
    }
    if !project.image_paths.is_empty() {
        println!("  Images:");
        for path in &project.image_paths {
            println!("    {path}");
        }
    }
    Ok(())
}

fn execute_delete(storage: &mut SqliteStorage, id: i64, json: bool) -> Result<()> {
    if !storage.delete_project(id)? {
        return Err(Error::ProjectNotFound { id });
    }

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted project {id}");
    }
    Ok(())
}

fn execute_attach_image(
    storage: &mut SqliteStorage,
    id: i64,
    path: &PathBuf,
    json: bool,
) -> Result<()> {
    let mut project = storage
        .get_project(id)?
        .ok_or(Error::ProjectNotFound { id })?;

    if !path.exists() {
        return Err(Error::InvalidArgument(format!(
            "image file not found: {}",
            path.display()
        )));
    }

    let dirs = AppDirs::resolve()?;
    let relocator = ImageRelocator::new(&dirs);
    let index = project.image_paths.len();

    let relocated = relocator
        .relocate(path, id, index)
        .ok_or_else(|| Error::Other("Failed to copy image into internal storage".to_string()))?;

    project
        .image_paths
        .push(relocated.to_string_lossy().into_owned());
    storage.upsert_project(&project)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "id": id, "image": relocated.display().to_string() })
        );
    } else {
        println!("Attached image to project {id}");
        println!("  Stored at: {}", relocated.display());
    }
    Ok(())
}

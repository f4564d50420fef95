//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::model::ProjectKind;

pub mod commands;

/// StitchTrack CLI - stitch and row counters for knitting projects
#[derive(Parser, Debug)]
#[command(name = "st", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: platform data directory)
    #[arg(long, global = true, env = "ST_DB")]
    pub db: Option<PathBuf>,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the project database
    Init {
        /// Overwrite an existing database
        #[arg(long)]
        force: bool,
    },

    /// Print version information
    Version,

    /// Project management
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Adjust a project counter by its step
    Count {
        /// Project ID
        id: i64,

        /// Which counter to adjust
        #[arg(value_enum)]
        counter: Counter,

        /// Count down instead of up (clamped at zero)
        #[arg(long)]
        down: bool,
    },

    /// Backup archive export/import
    Backup {
        #[command(subcommand)]
        command: BackupCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Add a new project
    Add(ProjectAddArgs),

    /// List all projects
    List,

    /// Show project details
    Show {
        /// Project ID
        id: i64,
    },

    /// Delete a project
    Delete {
        /// Project ID
        id: i64,
    },

    /// Copy an image into internal storage and attach it to a project
    AttachImage {
        /// Project ID
        id: i64,

        /// Path to the image file
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct ProjectAddArgs {
    /// Project title
    pub title: String,

    /// Counter layout (single, double)
    #[arg(short, long, value_enum, default_value_t)]
    pub kind: KindArg,

    /// Stitch counter step size
    #[arg(long, default_value = "1")]
    pub stitch_step: i32,

    /// Row counter step size (double projects)
    #[arg(long, default_value = "1")]
    pub row_step: i32,

    /// Target row count (0 = no target)
    #[arg(long, default_value = "0")]
    pub total_rows: i32,
}

/// Counter layout argument, mapped onto the domain kind.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KindArg {
    /// One stitch counter
    #[default]
    Single,
    /// Stitch and row counters
    Double,
}

impl From<KindArg> for ProjectKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Single => ProjectKind::Single,
            KindArg::Double => ProjectKind::Double,
        }
    }
}

/// Which counter a `count` invocation targets.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Counter {
    Stitch,
    Row,
}

#[derive(Subcommand, Debug)]
pub enum BackupCommands {
    /// Export all projects to a backup archive
    Export {
        /// Archive destination (default: Documents folder, timestamped name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Restore projects from a backup archive
    Import {
        /// Path to the backup archive
        file: PathBuf,

        /// Keep the ids carried in the archive, overwriting matching projects
        #[arg(long)]
        replace: bool,
    },
}

/// Supported shells for completions.
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

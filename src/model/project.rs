//! Project model for stitchtrack.
//!
//! A project is one piece of work on the needles: either a single free
//! counter or a paired stitch+row counter with an optional row target.

use serde::{Deserialize, Serialize};

/// Sentinel id for a project that has not been persisted yet.
///
/// The store assigns a real id on first upsert.
pub const UNASSIGNED_ID: i64 = 0;

/// Counter layout of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    /// One free-running counter.
    Single,
    /// Paired stitch and row counters.
    Double,
}

impl ProjectKind {
    /// Lowercase wire token ("single"/"double") used in backup manifests.
    #[must_use]
    pub const fn token(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Double => "double",
        }
    }

    /// Parse a wire token. Anything that is not "double" is treated as
    /// single, matching how older backups are read.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        if token == "double" {
            Self::Double
        } else {
            Self::Single
        }
    }
}

impl std::fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// A counting project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Store-assigned identifier; `UNASSIGNED_ID` until persisted.
    pub id: i64,

    /// Counter layout.
    pub kind: ProjectKind,

    /// Display title.
    pub title: String,

    /// Current stitch count.
    pub stitch_count: i32,

    /// Step applied per stitch adjustment.
    pub stitch_step: i32,

    /// Current row count.
    pub row_count: i32,

    /// Step applied per row adjustment.
    pub row_step: i32,

    /// Target number of rows; 0 = unbounded.
    pub total_rows: i32,

    /// Ordered absolute paths of attached images in internal storage.
    pub image_paths: Vec<String>,
}

impl Project {
    /// Create a fresh, not-yet-persisted project with zeroed counters.
    #[must_use]
    pub fn new(title: String, kind: ProjectKind) -> Self {
        Self {
            id: UNASSIGNED_ID,
            kind,
            title,
            stitch_count: 0,
            stitch_step: 1,
            row_count: 0,
            row_step: 1,
            total_rows: 0,
            image_paths: Vec::new(),
        }
    }

    /// Whether this project has been persisted.
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        self.id != UNASSIGNED_ID
    }
}

//! Data types for stitchtrack.

pub mod project;

pub use project::{Project, ProjectKind, UNASSIGNED_ID};

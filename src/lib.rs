//! StitchTrack CLI - stitch and row counters for knitting projects
//!
//! This crate provides the core functionality for the `st` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Data types (Project, ProjectKind)
//! - [`storage`] - SQLite database layer
//! - [`backup`] - Zip archive export/import of the project library
//! - [`config`] - Database path resolution
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod storage;

pub use error::{Error, Result};

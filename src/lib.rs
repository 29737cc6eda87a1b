//! Transparent path redirection for Windows-style filesystem paths.
//!
//! Applications open, create, and enumerate files via absolute or
//! handle-relative paths; a rule-driven director rewrites those paths to
//! alternate locations on the fly. Unredirected files remain visible where
//! expected, redirected targets overlay or replace them, and directory
//! enumerations are merged so the application sees one consistent namespace.
//!
//! This crate is the decision-making core. It performs no I/O of its own:
//! rules are parsed and validated by a [`director::DirectorBuilder`],
//! finalized into an immutable [`director::FilesystemDirector`], and every
//! query then yields a declarative [`instruction`] for an external executor
//! to carry out. Reference expansion (`%DOMAIN::NAME%`) in rule definitions
//! is handled by the [`resolver`].

pub mod config;
pub mod director;
pub mod error;
pub mod filesystem;
pub mod instruction;
pub mod path_utils;
pub mod prefix_tree;
pub mod resolver;
pub mod rules;

pub use config::Config;
pub use director::{CreateDisposition, DirectorBuilder, FileAccessMode, FilesystemDirector};
pub use error::{PathwinderError, Result};

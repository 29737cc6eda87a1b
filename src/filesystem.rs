//! Filesystem abstraction for testability.
//!
//! The director and its builder only ever probe individual paths; this trait
//! captures exactly those probes so tests can substitute an in-memory
//! filesystem.

use std::path::Path;

/// Trait for the filesystem probes consumed by rule finalization and
/// instruction generation.
pub trait FileSystem {
    /// Check if a path exists at all.
    fn exists(&self, path: &str) -> bool;

    /// Check if a path exists and is a directory.
    fn is_directory(&self, path: &str) -> bool;
}

/// Real filesystem implementation. Paths are passed to the operating system
/// as given; on non-Windows hosts, Windows-style absolute paths simply do not
/// exist, which reads as "not present".
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }

    fn is_directory(&self, path: &str) -> bool {
        Path::new(path).is_dir()
    }
}

impl<F: FileSystem> FileSystem for &F {
    fn exists(&self, path: &str) -> bool {
        (*self).exists(path)
    }

    fn is_directory(&self, path: &str) -> bool {
        (*self).is_directory(path)
    }
}

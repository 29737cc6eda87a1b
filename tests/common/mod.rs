//! Shared test doubles for integration tests.

use std::collections::{HashMap, HashSet};

use pathwinder::filesystem::FileSystem;
use pathwinder::path_utils;
use pathwinder::resolver::Environment;

/// In-memory filesystem; adding an entry also adds its ancestor directories.
#[derive(Debug, Default)]
pub struct TestFileSystem {
    directories: HashSet<String>,
    files: HashSet<String>,
}

impl TestFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_directory(&mut self, path: &str) {
        let mut current = normalize(path);
        while !current.is_empty() {
            self.directories.insert(current.clone());
            current = path_utils::parent_of(&current).to_string();
        }
    }

    #[allow(dead_code)]
    pub fn add_file(&mut self, path: &str) {
        let normalized = normalize(path);
        let parent = path_utils::parent_of(&normalized).to_string();
        self.files.insert(normalized);
        if !parent.is_empty() {
            self.add_directory(&parent);
        }
    }
}

impl FileSystem for TestFileSystem {
    fn exists(&self, path: &str) -> bool {
        let normalized = normalize(path);
        self.directories.contains(&normalized) || self.files.contains(&normalized)
    }

    fn is_directory(&self, path: &str) -> bool {
        self.directories.contains(&normalize(path))
    }
}

fn normalize(path: &str) -> String {
    let body = &path[path_utils::windows_namespace_prefix(path).len()..];
    path_utils::remove_trailing(body, '\\').to_ascii_lowercase()
}

/// Environment with fixed probe results.
#[derive(Debug, Default)]
pub struct TestEnvironment {
    env_vars: HashMap<String, String>,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn with_env_var(mut self, name: &str, value: &str) -> Self {
        self.env_vars
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }
}

impl Environment for TestEnvironment {
    fn env_var(&self, name: &str) -> Option<String> {
        self.env_vars.get(&name.to_ascii_lowercase()).cloned()
    }

    fn known_folder(&self, _name: &str) -> Option<String> {
        None
    }

    fn executable_path(&self) -> Option<String> {
        Some("C:\\Programs\\App\\app.exe".to_string())
    }

    fn hostname(&self) -> Option<String> {
        Some("TESTHOST".to_string())
    }
}

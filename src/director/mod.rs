//! Rule selection and instruction generation.
//!
//! A [`FilesystemDirector`] is the immutable, finalized form of a rule
//! registry. It is built once by a [`DirectorBuilder`], after which every
//! query is a pure function of the director state and its inputs, so a
//! director can be shared freely across threads.

mod builder;
mod enumeration;
mod file_operation;
#[cfg(test)]
mod test_support;

use indexmap::{IndexMap, IndexSet};

use crate::filesystem::{FileSystem, RealFileSystem};
use crate::path_utils::{self, AsciiCaseKey};
use crate::prefix_tree::PrefixTree;
use crate::rules::{FilesystemRule, RelatedRuleContainer};

pub use builder::{DirectorBuilder, is_valid_directory_string, is_valid_file_pattern_string};

/// File access types requested by the application. These can exist in
/// combination. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileAccessMode {
    read: bool,
    write: bool,
    delete: bool,
}

impl FileAccessMode {
    #[must_use]
    pub const fn new(read: bool, write: bool, delete: bool) -> Self {
        Self {
            read,
            write,
            delete,
        }
    }

    #[must_use]
    pub const fn read_only() -> Self {
        Self::new(true, false, false)
    }

    #[must_use]
    pub const fn read_write() -> Self {
        Self::new(true, true, false)
    }

    #[must_use]
    pub const fn delete() -> Self {
        Self::new(false, false, true)
    }

    #[must_use]
    pub const fn allows_read(self) -> bool {
        self.read
    }

    #[must_use]
    pub const fn allows_write(self) -> bool {
        self.write
    }

    #[must_use]
    pub const fn allows_delete(self) -> bool {
        self.delete
    }
}

/// Create disposition requested by the application, expressed as which file
/// access outcomes it permits. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateDisposition {
    create_new: bool,
    open_existing: bool,
}

impl CreateDisposition {
    #[must_use]
    pub const fn create_new_file() -> Self {
        Self {
            create_new: true,
            open_existing: false,
        }
    }

    #[must_use]
    pub const fn open_existing_file() -> Self {
        Self {
            create_new: false,
            open_existing: true,
        }
    }

    #[must_use]
    pub const fn create_new_or_open_existing_file() -> Self {
        Self {
            create_new: true,
            open_existing: true,
        }
    }

    #[must_use]
    pub const fn allows_create_new_file(self) -> bool {
        self.create_new
    }

    #[must_use]
    pub const fn allows_open_existing_file(self) -> bool {
        self.open_existing
    }
}

/// Holds filesystem rules indexed for path lookup and applies them to
/// generate redirection instructions.
#[derive(Debug)]
pub struct FilesystemDirector<F: FileSystem = RealFileSystem> {
    filesystem: F,
    rules_by_origin: PrefixTree<RelatedRuleContainer>,
    origin_by_rule_name: IndexMap<AsciiCaseKey, String>,
    origin_directories: IndexSet<AsciiCaseKey>,
    target_directories: IndexSet<AsciiCaseKey>,
}

impl<F: FileSystem> FilesystemDirector<F> {
    pub(crate) const fn from_parts(
        filesystem: F,
        rules_by_origin: PrefixTree<RelatedRuleContainer>,
        origin_by_rule_name: IndexMap<AsciiCaseKey, String>,
        origin_directories: IndexSet<AsciiCaseKey>,
        target_directories: IndexSet<AsciiCaseKey>,
    ) -> Self {
        Self {
            filesystem,
            rules_by_origin,
            origin_by_rule_name,
            origin_directories,
            target_directories,
        }
    }

    /// Number of rules held by this director.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.origin_by_rule_name.len()
    }

    /// Selects the container of rules applicable to `absolute_path`: the one
    /// whose origin directory is the longest matching prefix of the path.
    ///
    /// Multiple rules can have an origin directory that prefixes the query
    /// path; the most specific one applies. With rules rooted at
    /// `C:\Dir1\Dir2` and `C:\Dir1`, the path `C:\Dir1\Dir2\file.txt` uses
    /// `C:\Dir1\Dir2` even though both match.
    #[must_use]
    pub fn select_rules_for_path(&self, absolute_path: &str) -> Option<&RelatedRuleContainer> {
        let trimmed = Self::trim_for_query(absolute_path);
        let node = self.rules_by_origin.longest_matching_prefix(trimmed)?;
        self.rules_by_origin.data(node)
    }

    /// Checks whether `absolute_path` is an ancestor of some rule's origin
    /// directory. Such a path warrants handle tracking even though no rule
    /// applies to it directly: a later handle-relative path may reach rule
    /// scope.
    #[must_use]
    pub fn is_prefix_for_any_rule(&self, absolute_path: &str) -> bool {
        let trimmed = Self::trim_for_query(absolute_path);
        self.rules_by_origin.has_path_for_prefix(trimmed)
    }

    /// Rule with the given name, if any.
    #[must_use]
    pub fn find_rule_by_name(&self, name: &str) -> Option<&FilesystemRule> {
        let origin = self.origin_by_rule_name.get(&AsciiCaseKey::new(name))?;
        let node = self.rules_by_origin.find(origin)?;
        self.rules_by_origin.data(node)?.rule_named(name)
    }

    /// Container of rules whose shared origin directory is exactly
    /// `origin_directory`.
    #[must_use]
    pub fn find_rules_by_origin_directory(
        &self,
        origin_directory: &str,
    ) -> Option<&RelatedRuleContainer> {
        let trimmed = Self::trim_for_query(origin_directory);
        let node = self.rules_by_origin.find(trimmed)?;
        self.rules_by_origin.data(node)
    }

    /// Checks whether any rule uses `path` as its origin or target directory.
    #[must_use]
    pub fn has_directory(&self, path: &str) -> bool {
        self.has_origin_directory(path) || self.has_target_directory(path)
    }

    /// Checks whether any rule uses `path` as its origin directory.
    #[must_use]
    pub fn has_origin_directory(&self, path: &str) -> bool {
        self.origin_directories
            .contains(&AsciiCaseKey::new(Self::trim_for_query(path)))
    }

    /// Checks whether any rule uses `path` as its target directory.
    #[must_use]
    pub fn has_target_directory(&self, path: &str) -> bool {
        self.target_directories
            .contains(&AsciiCaseKey::new(Self::trim_for_query(path)))
    }

    pub(crate) fn filesystem(&self) -> &F {
        &self.filesystem
    }

    pub(crate) const fn rules_by_origin(&self) -> &PrefixTree<RelatedRuleContainer> {
        &self.rules_by_origin
    }

    /// Strips the Windows namespace prefix and any trailing separators, the
    /// canonical form used for all rule lookups.
    fn trim_for_query(path: &str) -> &str {
        path_utils::remove_trailing(
            &path[path_utils::windows_namespace_prefix(path).len()..],
            '\\',
        )
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

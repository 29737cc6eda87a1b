//! Mutable registry of filesystem rules and its finalization into a
//! director.

use indexmap::{IndexMap, IndexSet};

use crate::config::{Config, RuleConfig};
use crate::error::{DirectoryRole, PathwinderError, Result};
use crate::filesystem::{FileSystem, RealFileSystem};
use crate::path_utils::{self, AsciiCaseKey};
use crate::prefix_tree::PrefixTree;
use crate::resolver::{Environment, Resolver, SystemEnvironment};
use crate::rules::{
    DirectoryComparison, FilesystemRule, RedirectMode, RelatedRuleContainer, compare_directories,
};

use super::FilesystemDirector;

/// Checks if a candidate string is valid for use as an origin or target
/// directory: non-empty, printable, free of wildcards and other disallowed
/// characters, and not ending in a separator.
#[must_use]
pub fn is_valid_directory_string(candidate: &str) -> bool {
    const DISALLOWED: &[char] = &['/', '*', '?', '"', '<', '>', '|'];
    !candidate.is_empty()
        && !candidate.ends_with('\\')
        && candidate
            .chars()
            .all(|ch| !ch.is_control() && !DISALLOWED.contains(&ch))
}

/// Checks if a candidate string is valid for use as a file pattern:
/// non-empty and printable. Wildcards are allowed; separators and drive
/// designators are not, because patterns identify names within a directory.
#[must_use]
pub fn is_valid_file_pattern_string(candidate: &str) -> bool {
    const DISALLOWED: &[char] = &['\\', '/', ':', '"', '<', '>', '|'];
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|ch| !ch.is_control() && !DISALLOWED.contains(&ch))
}

/// Builds filesystem rules, enforces consistency between them, and finalizes
/// them into an immutable [`FilesystemDirector`].
///
/// Constraints checked as each rule is added: unique rule name, valid
/// directory and pattern strings, origin not in use as a target, target not
/// in use as an origin, and target shared only among rules with the same
/// origin. Constraints that depend on the full rule set and the real
/// filesystem are checked by [`Self::build`].
pub struct DirectorBuilder<F: FileSystem = RealFileSystem, E: Environment = SystemEnvironment> {
    filesystem: F,
    resolver: Resolver<E>,
    rules_by_name: IndexMap<AsciiCaseKey, FilesystemRule>,
    origin_directories: IndexSet<AsciiCaseKey>,
    target_directories: IndexSet<AsciiCaseKey>,
}

impl Default for DirectorBuilder<RealFileSystem, SystemEnvironment> {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectorBuilder<RealFileSystem, SystemEnvironment> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_components(RealFileSystem, Resolver::new())
    }
}

impl<F: FileSystem, E: Environment> DirectorBuilder<F, E> {
    /// Creates a builder over the given filesystem probes and resolver.
    #[must_use]
    pub fn with_components(filesystem: F, resolver: Resolver<E>) -> Self {
        Self {
            filesystem,
            resolver,
            rules_by_name: IndexMap::new(),
            origin_directories: IndexSet::new(),
            target_directories: IndexSet::new(),
        }
    }

    /// Mutable access to the resolver, for supplying `CONF` definitions or
    /// registering custom reference domains before rules are added.
    pub fn resolver_mut(&mut self) -> &mut Resolver<E> {
        &mut self.resolver
    }

    /// Attempts to create a new rule and add it to the registry. Origin and
    /// target may contain `%DOMAIN::NAME%` references and `.`/`..`
    /// components; both are expanded here.
    ///
    /// # Errors
    /// Returns an error for a duplicate name, an invalid directory or
    /// pattern string, a reference expansion failure, a filesystem-root
    /// directory, or a conflict with a directory already claimed by another
    /// rule.
    pub fn add_rule(
        &mut self,
        name: &str,
        origin_directory: &str,
        target_directory: &str,
        file_patterns: Vec<String>,
        redirect_mode: RedirectMode,
    ) -> Result<&FilesystemRule> {
        let name_key = AsciiCaseKey::new(name);
        if self.rules_by_name.contains_key(&name_key) {
            return Err(PathwinderError::DuplicateRuleName {
                rule: name.to_string(),
            });
        }

        for pattern in &file_patterns {
            if !is_valid_file_pattern_string(pattern) {
                return Err(PathwinderError::InvalidFilePattern {
                    rule: name.to_string(),
                    pattern: pattern.clone(),
                });
            }
        }

        let origin_full = self.prepare_directory(name, origin_directory, DirectoryRole::Origin)?;
        let target_full = self.prepare_directory(name, target_directory, DirectoryRole::Target)?;
        let origin_key = AsciiCaseKey::new(&origin_full);
        let target_key = AsciiCaseKey::new(&target_full);

        if self.target_directories.contains(&origin_key) {
            return Err(PathwinderError::OriginConflictsWithTarget {
                rule: name.to_string(),
            });
        }
        if origin_key == target_key || self.origin_directories.contains(&target_key) {
            return Err(PathwinderError::TargetConflictsWithOrigin {
                rule: name.to_string(),
            });
        }
        if self.target_directories.contains(&target_key)
            && let Some(other) = self.rules_by_name.values().find(|existing| {
                path_utils::eq_case_insensitive(
                    existing.target_directory_full_path(),
                    &target_full,
                ) && !path_utils::eq_case_insensitive(
                    existing.origin_directory_full_path(),
                    &origin_full,
                )
            })
        {
            return Err(PathwinderError::TargetSharedAcrossOrigins {
                rule: name.to_string(),
                other_rule: other.name().to_string(),
            });
        }

        let rule = FilesystemRule::new(name, &origin_full, &target_full, file_patterns, redirect_mode)?;
        self.origin_directories.insert(origin_key);
        self.target_directories.insert(target_key);
        self.rules_by_name.insert(name_key.clone(), rule);
        Ok(&self.rules_by_name[&name_key])
    }

    /// Adds a rule from its configuration section.
    ///
    /// # Errors
    /// Returns an error if a required key is missing or [`Self::add_rule`]
    /// rejects the rule.
    pub fn add_rule_from_config(&mut self, name: &str, section: &RuleConfig) -> Result<&FilesystemRule> {
        let origin_directory =
            section
                .origin_directory
                .as_deref()
                .ok_or(PathwinderError::MissingConfigKey {
                    rule: name.to_string(),
                    key: "origin_directory",
                })?;
        let target_directory =
            section
                .target_directory
                .as_deref()
                .ok_or(PathwinderError::MissingConfigKey {
                    rule: name.to_string(),
                    key: "target_directory",
                })?;
        self.add_rule(
            name,
            origin_directory,
            target_directory,
            section.file_patterns.clone(),
            section.redirect_mode.unwrap_or_default(),
        )
    }

    /// Installs the configuration's definitions into the resolver and adds
    /// every rule section, in configuration order.
    ///
    /// # Errors
    /// Returns the first error encountered while adding a rule.
    pub fn add_rules_from_config(&mut self, config: &Config) -> Result<()> {
        if !config.definitions.is_empty() {
            self.resolver
                .set_definitions(config.definitions.iter().map(|(name, value)| {
                    (name.as_str(), value.clone())
                }));
        }
        for (name, section) in &config.rules {
            self.add_rule_from_config(name, section)?;
        }
        Ok(())
    }

    /// Checks whether any rule added so far uses `path` as its origin or
    /// target directory.
    #[must_use]
    pub fn has_directory(&self, path: &str) -> bool {
        self.has_origin_directory(path) || self.has_target_directory(path)
    }

    /// Checks whether any rule added so far uses `path` as its origin
    /// directory.
    #[must_use]
    pub fn has_origin_directory(&self, path: &str) -> bool {
        self.origin_directories.contains(&AsciiCaseKey::new(path))
    }

    /// Checks whether any rule added so far uses `path` as its target
    /// directory.
    #[must_use]
    pub fn has_target_directory(&self, path: &str) -> bool {
        self.target_directories.contains(&AsciiCaseKey::new(path))
    }

    /// Finalizes the registry into an immutable director, first enforcing
    /// the constraints that require the complete rule set: every origin
    /// directory either absent from the real filesystem or present as a
    /// directory, every origin parent backed by a real directory or another
    /// rule's origin, and no target directory inside the hierarchy of any
    /// other rule's origin or target.
    ///
    /// # Errors
    /// Returns an error naming the first rule that violates a constraint, or
    /// [`PathwinderError::EmptyRegistry`] if no rules were added.
    pub fn build(self) -> Result<FilesystemDirector<F>> {
        if self.rules_by_name.is_empty() {
            return Err(PathwinderError::EmptyRegistry);
        }

        for rule in self.rules_by_name.values() {
            let origin = rule.origin_directory_full_path();
            if self.filesystem.exists(origin) && !self.filesystem.is_directory(origin) {
                return Err(PathwinderError::OriginExistsNotAsDirectory {
                    rule: rule.name().to_string(),
                });
            }

            let parent = rule.origin_directory_parent();
            if !self.filesystem.is_directory(parent)
                && !self.origin_directories.contains(&AsciiCaseKey::new(parent))
            {
                return Err(PathwinderError::OriginParentMissing {
                    rule: rule.name().to_string(),
                });
            }
        }
        self.check_target_hierarchies()?;

        let mut rules_by_origin: PrefixTree<RelatedRuleContainer> = PrefixTree::new();
        let mut origin_by_rule_name = IndexMap::new();
        for (name_key, rule) in self.rules_by_name {
            let origin = rule.origin_directory_full_path().to_string();
            let (node, _) = rules_by_origin.insert(&origin, RelatedRuleContainer::new());
            if let Some(container) = rules_by_origin.data_mut(node) {
                container.insert(rule);
            }
            origin_by_rule_name.insert(name_key, origin);
        }

        Ok(FilesystemDirector::from_parts(
            self.filesystem,
            rules_by_origin,
            origin_by_rule_name,
            self.origin_directories,
            self.target_directories,
        ))
    }

    /// Forbids cross-contamination between redirection endpoints: a target
    /// directory may not sit inside (or contain) any rule's origin directory
    /// or any other rule's target directory.
    fn check_target_hierarchies(&self) -> Result<()> {
        for rule in self.rules_by_name.values() {
            let target = rule.target_directory_full_path();
            for other in self.rules_by_name.values() {
                let origin_comparison =
                    compare_directories(target, other.origin_directory_full_path());
                if origin_comparison != DirectoryComparison::Unrelated {
                    return Err(PathwinderError::TargetHierarchyConflict {
                        rule: rule.name().to_string(),
                        target: target.to_string(),
                        other_rule: other.name().to_string(),
                        other: other.origin_directory_full_path().to_string(),
                    });
                }

                if path_utils::eq_case_insensitive(rule.name(), other.name()) {
                    continue;
                }
                let target_comparison =
                    compare_directories(target, other.target_directory_full_path());
                if !matches!(
                    target_comparison,
                    DirectoryComparison::Unrelated | DirectoryComparison::Equal
                ) {
                    return Err(PathwinderError::TargetHierarchyConflict {
                        rule: rule.name().to_string(),
                        target: target.to_string(),
                        other_rule: other.name().to_string(),
                        other: other.target_directory_full_path().to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Expands references in a configured directory string and canonicalizes
    /// it to an absolute path with no namespace prefix, no trailing
    /// separator, and no relative components.
    fn prepare_directory(
        &mut self,
        rule_name: &str,
        configured: &str,
        role: DirectoryRole,
    ) -> Result<String> {
        let resolved = self.resolver.resolve_all_references(configured)?;
        let body = &resolved[path_utils::windows_namespace_prefix(&resolved).len()..];
        let trimmed = path_utils::remove_trailing(body, '\\');

        if !is_valid_directory_string(trimmed) {
            return Err(PathwinderError::InvalidDirectoryString {
                rule: rule_name.to_string(),
                role,
                path: resolved.clone(),
            });
        }

        let bytes = trimmed.as_bytes();
        if bytes.len() < 2 || !bytes[0].is_ascii_alphabetic() || bytes[1] != b':' {
            return Err(PathwinderError::DirectoryNotAbsolute {
                rule: rule_name.to_string(),
                role,
                path: resolved.clone(),
            });
        }

        let full_path = path_utils::canonicalize_components(trimmed)?;
        if path_utils::parent_of(&full_path).is_empty() {
            return Err(PathwinderError::DirectoryIsFilesystemRoot {
                rule: rule_name.to_string(),
                role,
            });
        }
        Ok(full_path)
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;

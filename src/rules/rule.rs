//! Immutable filesystem rule values.

use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};
use serde::{Deserialize, Serialize};

use crate::error::{PathwinderError, Result};
use crate::path_utils;

/// Upper bound on the length of a rewritten path.
const MAX_REDIRECTED_PATH_LENGTH: usize = 2048;

/// Policy for combining the origin and target sides of a redirection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedirectMode {
    /// Only the target side is visible.
    #[default]
    Simple,
    /// Target side first, origin side underneath.
    Overlay,
    /// Overlay variant intended for write-promotion semantics. Identical to
    /// `Overlay` during instruction generation.
    OverlayCopyOnWrite,
}

impl RedirectMode {
    /// True for both overlay variants.
    #[must_use]
    pub const fn is_overlay(self) -> bool {
        matches!(self, Self::Overlay | Self::OverlayCopyOnWrite)
    }
}

/// Relationship between a candidate directory and a reference directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryComparison {
    Equal,
    /// Candidate is one component below the reference directory.
    CandidateIsChild,
    /// Candidate is two or more components below the reference directory.
    CandidateIsDescendant,
    /// Candidate is one component above the reference directory.
    CandidateIsParent,
    /// Candidate is two or more components above the reference directory.
    CandidateIsAncestor,
    Unrelated,
}

impl DirectoryComparison {
    /// True when the candidate lies at or below the reference directory, the
    /// precondition for rewriting its prefix.
    #[must_use]
    pub const fn is_at_or_below(self) -> bool {
        matches!(
            self,
            Self::Equal | Self::CandidateIsChild | Self::CandidateIsDescendant
        )
    }
}

/// Compares two absolute directory paths, both free of namespace prefixes and
/// trailing separators, case-insensitively.
#[must_use]
pub fn compare_directories(candidate: &str, reference: &str) -> DirectoryComparison {
    if path_utils::eq_case_insensitive(candidate, reference) {
        return DirectoryComparison::Equal;
    }
    if is_path_prefix(candidate, reference) {
        return if candidate[reference.len() + 1..].contains('\\') {
            DirectoryComparison::CandidateIsDescendant
        } else {
            DirectoryComparison::CandidateIsChild
        };
    }
    if is_path_prefix(reference, candidate) {
        return if reference[candidate.len() + 1..].contains('\\') {
            DirectoryComparison::CandidateIsAncestor
        } else {
            DirectoryComparison::CandidateIsParent
        };
    }
    DirectoryComparison::Unrelated
}

/// Checks that `prefix` is a whole-component path prefix of `path`, meaning a
/// separator follows it.
fn is_path_prefix(path: &str, prefix: &str) -> bool {
    path.len() > prefix.len()
        && path_utils::starts_with_case_insensitive(path, prefix)
        && path.as_bytes()[prefix.len()] == b'\\'
}

/// A glob pattern paired with its compiled matcher.
#[derive(Debug, Clone)]
pub struct FilePattern {
    text: String,
    matcher: GlobMatcher,
}

impl FilePattern {
    fn compile(rule_name: &str, text: &str) -> Result<Self> {
        let glob = GlobBuilder::new(text)
            .case_insensitive(true)
            .build()
            .map_err(|source| PathwinderError::FilePatternCompile {
                rule: rule_name.to_string(),
                pattern: text.to_string(),
                source,
            })?;
        Ok(Self {
            text: text.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn matches(&self, file_name: &str) -> bool {
        self.matcher.is_match(Path::new(file_name))
    }
}

impl PartialEq for FilePattern {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for FilePattern {}

/// A single filesystem redirection rule. Immutable once constructed: a name,
/// canonical origin and target directories, optional file patterns narrowing
/// the rule's scope, and a redirect mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemRule {
    name: String,
    origin_directory: String,
    target_directory: String,
    file_patterns: Vec<FilePattern>,
    redirect_mode: RedirectMode,
}

impl FilesystemRule {
    /// Creates a rule. Origin and target are canonicalized by stripping any
    /// Windows namespace prefix and trailing separators. A pattern list that
    /// is empty or consists only of universal wildcards (`""`, `"*"`, `"**"`,
    /// and so on) is recorded as no patterns at all.
    ///
    /// # Errors
    /// Returns an error if a file pattern fails to compile.
    pub fn new(
        name: &str,
        origin_directory: &str,
        target_directory: &str,
        file_patterns: Vec<String>,
        redirect_mode: RedirectMode,
    ) -> Result<Self> {
        let canonicalize = |path: &str| {
            let body = &path[path_utils::windows_namespace_prefix(path).len()..];
            path_utils::remove_trailing(body, '\\').to_string()
        };

        let all_universal = file_patterns
            .iter()
            .all(|pattern| pattern.chars().all(|ch| ch == '*'));
        let compiled = if all_universal {
            Vec::new()
        } else {
            file_patterns
                .iter()
                .map(|pattern| FilePattern::compile(name, pattern))
                .collect::<Result<Vec<_>>>()?
        };

        Ok(Self {
            name: name.to_string(),
            origin_directory: canonicalize(origin_directory),
            target_directory: canonicalize(target_directory),
            file_patterns: compiled,
            redirect_mode,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn origin_directory_full_path(&self) -> &str {
        &self.origin_directory
    }

    #[must_use]
    pub fn target_directory_full_path(&self) -> &str {
        &self.target_directory
    }

    /// Base name of the origin directory.
    #[must_use]
    pub fn origin_directory_name(&self) -> &str {
        path_utils::last_component(&self.origin_directory)
    }

    /// Absolute path of the origin directory's parent; empty for a root.
    #[must_use]
    pub fn origin_directory_parent(&self) -> &str {
        path_utils::parent_of(&self.origin_directory)
    }

    /// Base name of the target directory.
    #[must_use]
    pub fn target_directory_name(&self) -> &str {
        path_utils::last_component(&self.target_directory)
    }

    /// Absolute path of the target directory's parent; empty for a root.
    #[must_use]
    pub fn target_directory_parent(&self) -> &str {
        path_utils::parent_of(&self.target_directory)
    }

    #[must_use]
    pub const fn redirect_mode(&self) -> RedirectMode {
        self.redirect_mode
    }

    /// Iterates over the texts of this rule's file patterns.
    pub fn file_patterns(&self) -> impl Iterator<Item = &str> {
        self.file_patterns.iter().map(FilePattern::text)
    }

    /// Number of file patterns. Zero means the rule matches all file names.
    #[must_use]
    pub fn file_pattern_count(&self) -> usize {
        self.file_patterns.len()
    }

    #[must_use]
    pub fn has_file_patterns(&self) -> bool {
        !self.file_patterns.is_empty()
    }

    /// Checks `file_name` against this rule's patterns. With no patterns
    /// every name matches.
    #[must_use]
    pub fn file_name_matches_any_pattern(&self, file_name: &str) -> bool {
        self.file_patterns.is_empty()
            || self
                .file_patterns
                .iter()
                .any(|pattern| pattern.matches(file_name))
    }

    /// Relationship of `candidate` to this rule's origin directory.
    #[must_use]
    pub fn directory_compare_with_origin(&self, candidate: &str) -> DirectoryComparison {
        compare_directories(candidate, &self.origin_directory)
    }

    /// Relationship of `candidate` to this rule's target directory.
    #[must_use]
    pub fn directory_compare_with_target(&self, candidate: &str) -> DirectoryComparison {
        compare_directories(candidate, &self.target_directory)
    }

    /// Rewrites a path from the origin hierarchy into the target hierarchy.
    /// `directory_part` must be at or below the origin directory, `file_part`
    /// is appended after a separator when non-empty, `namespace_prefix` is
    /// prepended verbatim, and `extra_suffix` (used to preserve a trailing
    /// separator from the input) is appended verbatim. Returns `None` when
    /// the directory part is out of scope or the result would be over-long.
    #[must_use]
    pub fn redirect_path_origin_to_target(
        &self,
        directory_part: &str,
        file_part: &str,
        namespace_prefix: &str,
        extra_suffix: &str,
    ) -> Option<String> {
        Self::rewrite_prefix(
            &self.origin_directory,
            &self.target_directory,
            directory_part,
            file_part,
            namespace_prefix,
            extra_suffix,
        )
    }

    /// Rewrites a path from the target hierarchy into the origin hierarchy.
    /// Mirror of [`Self::redirect_path_origin_to_target`].
    #[must_use]
    pub fn redirect_path_target_to_origin(
        &self,
        directory_part: &str,
        file_part: &str,
        namespace_prefix: &str,
        extra_suffix: &str,
    ) -> Option<String> {
        Self::rewrite_prefix(
            &self.target_directory,
            &self.origin_directory,
            directory_part,
            file_part,
            namespace_prefix,
            extra_suffix,
        )
    }

    fn rewrite_prefix(
        from: &str,
        to: &str,
        directory_part: &str,
        file_part: &str,
        namespace_prefix: &str,
        extra_suffix: &str,
    ) -> Option<String> {
        if !compare_directories(directory_part, from).is_at_or_below() {
            return None;
        }
        let remainder = &directory_part[from.len()..];

        let mut rewritten = String::with_capacity(
            namespace_prefix.len()
                + to.len()
                + remainder.len()
                + file_part.len()
                + extra_suffix.len()
                + 1,
        );
        rewritten.push_str(namespace_prefix);
        rewritten.push_str(to);
        rewritten.push_str(remainder);
        if !file_part.is_empty() {
            rewritten.push('\\');
            rewritten.push_str(file_part);
        }
        rewritten.push_str(extra_suffix);

        (rewritten.len() <= MAX_REDIRECTED_PATH_LENGTH).then_some(rewritten)
    }
}

#[cfg(test)]
#[path = "rule_tests.rs"]
mod tests;

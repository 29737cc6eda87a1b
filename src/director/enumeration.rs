//! Directory-enumeration instruction generation.

use log::{debug, error, info};

use crate::filesystem::FileSystem;
use crate::instruction::{
    DirectoryEnumerationInstruction, DirectoryPathSource, SingleDirectoryEnumeration,
    SingleDirectoryNameInsertion,
};
use crate::path_utils;
use crate::rules::{
    DirectoryComparison, FilePatternMatchCondition, FilesystemRule, RelatedRuleContainer,
};

use super::FilesystemDirector;

impl<F: FileSystem> FilesystemDirector<F> {
    /// Determines how to satisfy a directory enumeration requested on an
    /// open directory handle. `associated_path` is the application-facing
    /// path recorded when the handle was opened; `real_opened_path` is the
    /// path actually opened on the filesystem.
    ///
    /// Three independent parts compose the result. When the handle was
    /// redirected, the target-side contents in rule scope must be
    /// enumerated, potentially merged with out-of-scope origin-side
    /// contents. Whether or not a redirection took place, rule origin
    /// directories that are direct children of the queried path may need to
    /// be inserted into the output.
    #[must_use]
    pub fn instruction_for_directory_enumeration(
        &self,
        associated_path: &str,
        real_opened_path: &str,
    ) -> DirectoryEnumerationInstruction<'_> {
        let associated_path = path_utils::remove_trailing(associated_path, '\\');
        let real_opened_path = path_utils::remove_trailing(real_opened_path, '\\');

        let directories_to_enumerate = if path_utils::eq_case_insensitive(
            associated_path,
            real_opened_path,
        ) {
            // No redirection took place; the requested directory's contents
            // are enumerated as is.
            debug!(
                "directory enumeration query for '{real_opened_path}' does not match any rules"
            );
            vec![SingleDirectoryEnumeration::include_all_filenames(
                DirectoryPathSource::RealOpenedPath,
            )]
        } else {
            self.enumerations_for_redirected_handle(associated_path, real_opened_path)
        };

        let directory_names_to_insert = self.origin_names_to_insert(associated_path);

        match directory_names_to_insert {
            Some(insertions) => {
                DirectoryEnumerationInstruction::enumerate_directories_and_insert_rule_origin_directory_names(
                    directories_to_enumerate,
                    insertions,
                )
            }
            None => DirectoryEnumerationInstruction::enumerate_directories(directories_to_enumerate),
        }
    }

    /// Parts 1 and 2: merge target-side and origin-side contents for a
    /// handle that was opened through a redirection.
    fn enumerations_for_redirected_handle(
        &self,
        associated_path: &str,
        real_opened_path: &str,
    ) -> Vec<SingleDirectoryEnumeration<'_>> {
        let associated_trimmed =
            &associated_path[path_utils::windows_namespace_prefix(associated_path).len()..];
        let real_opened_trimmed =
            &real_opened_path[path_utils::windows_namespace_prefix(real_opened_path).len()..];

        let Some(container) = self.select_rules_for_path(associated_trimmed) else {
            error!(
                "directory enumeration query for '{associated_path}' did not match any rules due to an internal error"
            );
            return vec![SingleDirectoryEnumeration::include_all_filenames(
                DirectoryPathSource::RealOpenedPath,
            )];
        };

        let query_is_origin_directory = container.any_rule().is_some_and(|rule| {
            rule.directory_compare_with_origin(associated_trimmed) == DirectoryComparison::Equal
        });

        if query_is_origin_directory && container.count() > 1 {
            return Self::enumerations_for_shared_origin(
                container,
                associated_path,
                real_opened_trimmed,
            );
        }

        // A single applicable rule, either because the container holds only
        // one or because the query is a descendant of the shared origin (in
        // which case the redirecting rule is the one whose target hierarchy
        // produced the real opened path).
        let redirecting_rule = container
            .all_rules()
            .find(|rule| {
                rule.directory_compare_with_target(real_opened_trimmed)
                    .is_at_or_below()
            })
            .or_else(|| container.any_rule());
        let Some(rule) = redirecting_rule else {
            error!(
                "directory enumeration query for '{associated_path}' selected an empty rule container due to an internal error"
            );
            return vec![SingleDirectoryEnumeration::include_all_filenames(
                DirectoryPathSource::RealOpenedPath,
            )];
        };

        if rule.redirect_mode().is_overlay() {
            // Overlay merges target-side contents with origin-side contents.
            // At the origin directory itself only in-scope target files are
            // included; a descendant is known to be wholly in scope because a
            // path component already matched the rule's file patterns.
            info!(
                "directory enumeration query for '{associated_path}' matches rule '{}' and will overlay the contents of '{real_opened_path}'",
                rule.name()
            );
            if query_is_origin_directory && rule.has_file_patterns() {
                vec![
                    SingleDirectoryEnumeration::include_only_matching_filenames(
                        DirectoryPathSource::RealOpenedPath,
                        rule,
                    ),
                    SingleDirectoryEnumeration::include_all_filenames(
                        DirectoryPathSource::AssociatedPath,
                    ),
                ]
            } else {
                vec![
                    SingleDirectoryEnumeration::include_all_filenames(
                        DirectoryPathSource::RealOpenedPath,
                    ),
                    SingleDirectoryEnumeration::include_all_filenames(
                        DirectoryPathSource::AssociatedPath,
                    ),
                ]
            }
        } else if !rule.has_file_patterns() || !query_is_origin_directory {
            // Without file patterns nothing on the origin side is out of
            // scope, and below the origin directory the redirection already
            // vouches for the whole directory; either way the open handle's
            // directory alone is enumerated.
            info!(
                "directory enumeration query for '{associated_path}' matches rule '{}' and will instead enumerate '{real_opened_path}'",
                rule.name()
            );
            vec![SingleDirectoryEnumeration::include_all_filenames(
                DirectoryPathSource::RealOpenedPath,
            )]
        } else {
            // In-scope files come from the target side, everything beyond the
            // rule's scope from the origin side.
            info!(
                "directory enumeration query for '{associated_path}' matches rule '{}' and will merge out-of-scope origin contents with in-scope target contents",
                rule.name()
            );
            vec![
                SingleDirectoryEnumeration::include_only_matching_filenames(
                    DirectoryPathSource::RealOpenedPath,
                    rule,
                ),
                SingleDirectoryEnumeration::include_all_except_matching_filenames(
                    DirectoryPathSource::AssociatedPath,
                    rule,
                ),
            ]
        }
    }

    /// Enumeration of the shared origin directory of multiple co-located
    /// rules: one entry per rule partitions the namespace by rule position,
    /// then the origin side is appended when some of it can remain visible.
    fn enumerations_for_shared_origin<'rules>(
        container: &'rules RelatedRuleContainer,
        associated_path: &str,
        real_opened_trimmed: &str,
    ) -> Vec<SingleDirectoryEnumeration<'rules>> {
        let opened_rule_index = container
            .all_rules()
            .position(|rule| {
                path_utils::eq_case_insensitive(
                    rule.target_directory_full_path(),
                    real_opened_trimmed,
                )
            })
            .unwrap_or(0);

        info!(
            "directory enumeration query for '{associated_path}' is for the shared origin directory of {} rules and will merge their target contents",
            container.count()
        );

        let mut enumerations: Vec<SingleDirectoryEnumeration<'rules>> = (0..container.count())
            .map(|rule_index| {
                // The handle is already open on the redirecting rule's target
                // directory, so that entry reads the real opened path rather
                // than looking the directory up again.
                let path_source = if rule_index == opened_rule_index {
                    DirectoryPathSource::RealOpenedPath
                } else {
                    DirectoryPathSource::FilePatternSourceTargetDirectory
                };
                SingleDirectoryEnumeration::include_only_matching_filenames_multi(
                    path_source,
                    container,
                    FilePatternMatchCondition::MatchByPositionInvertAllPriorToSelected,
                    rule_index,
                )
            })
            .collect();

        if container
            .all_rules()
            .all(|rule| rule.redirect_mode().is_overlay())
        {
            // All-overlay: the entire origin side stays visible underneath.
            enumerations.push(SingleDirectoryEnumeration::include_all_filenames(
                DirectoryPathSource::AssociatedPath,
            ));
        } else if container.all_rules().all(FilesystemRule::has_file_patterns) {
            // Every rule is scoped by patterns, so origin-side files beyond
            // every rule's scope remain visible. Overlay-mode matches are
            // inverted so those names also stay visible on the origin side.
            enumerations.push(
                SingleDirectoryEnumeration::include_all_except_matching_filenames_multi(
                    DirectoryPathSource::AssociatedPath,
                    container,
                    FilePatternMatchCondition::MatchByRedirectModeInvertOverlay,
                    0,
                ),
            );
        }
        // Otherwise some pattern-less rule in simple mode eclipses the whole
        // origin side; nothing of it is enumerated.

        enumerations
    }

    /// Part 3: rules whose origin directories are direct children of the
    /// queried path have their origin directory names inserted into the
    /// enumeration result. Whether each name is actually shown is decided at
    /// insertion time by the executor (the target directory must exist and
    /// the name must satisfy the application's query pattern).
    fn origin_names_to_insert(
        &self,
        associated_path: &str,
    ) -> Option<Vec<SingleDirectoryNameInsertion<'_>>> {
        let associated_trimmed =
            &associated_path[path_utils::windows_namespace_prefix(associated_path).len()..];

        let parent_node = self.rules_by_origin().traverse_to(associated_trimmed)?;
        let mut insertions: Vec<SingleDirectoryNameInsertion<'_>> = Vec::new();
        for child in self.rules_by_origin().children(parent_node) {
            let Some(container) = self.rules_by_origin().data(child) else {
                continue;
            };
            // Among co-located rules, prefer one whose target directory
            // really exists so the inserted entry can carry its metadata.
            let rule = container
                .all_rules()
                .find(|rule| {
                    self.filesystem()
                        .is_directory(rule.target_directory_full_path())
                })
                .or_else(|| container.any_rule());
            if let Some(rule) = rule {
                info!(
                    "directory enumeration query for '{associated_path}' may insert '{}' as the origin directory of rule '{}'",
                    rule.origin_directory_name(),
                    rule.name()
                );
                insertions.push(SingleDirectoryNameInsertion::new(rule));
            }
        }

        if insertions.is_empty() {
            return None;
        }
        // Enumerations usually present files in sorted order; inserted names
        // keep that property.
        insertions.sort_by(|a, b| {
            path_utils::compare_case_insensitive(a.file_name_to_insert(), b.file_name_to_insert())
        });
        Some(insertions)
    }
}

#[cfg(test)]
#[path = "enumeration_tests.rs"]
mod tests;

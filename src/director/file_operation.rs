//! File-operation instruction generation.

use log::{debug, error, info};

use crate::filesystem::FileSystem;
use crate::instruction::{
    CreateDispositionPreference, ExtraPreOperation, FileOperationInstruction, NameAssociation,
};
use crate::path_utils;
use crate::rules::DirectoryComparison;

use super::{CreateDisposition, FileAccessMode, FilesystemDirector};

impl<F: FileSystem> FilesystemDirector<F> {
    /// Determines how to redirect the file operation an application
    /// requested for `absolute_path`. Access mode and create disposition
    /// are derived by the caller from the platform-specific request.
    ///
    /// Failures inside this query never escalate: anything that prevents a
    /// redirection degrades to a neutral instruction with a diagnostic.
    #[must_use]
    pub fn instruction_for_file_operation(
        &self,
        absolute_path: &str,
        file_access_mode: FileAccessMode,
        create_disposition: CreateDisposition,
    ) -> FileOperationInstruction {
        let namespace_prefix = path_utils::windows_namespace_prefix(absolute_path);
        let body = &absolute_path[namespace_prefix.len()..];
        let trailing_suffix = if body.ends_with('\\') { "\\" } else { "" };
        let trimmed = path_utils::remove_trailing(body, '\\');

        if !path_utils::begins_with_drive_letter(trimmed) {
            debug!(
                "file operation query for '{absolute_path}' (access {file_access_mode:?}) does not begin with a drive letter and was skipped for redirection"
            );
            return FileOperationInstruction::no_redirection_or_interception();
        }

        let Some(last_separator) = trimmed.rfind('\\') else {
            debug!(
                "file operation query for '{absolute_path}' does not contain a path separator and was skipped for redirection"
            );
            return FileOperationInstruction::no_redirection_or_interception();
        };

        let Some(container) = self.select_rules_for_path(trimmed) else {
            debug!("file operation query for '{absolute_path}' did not match any rules");
            if self.is_prefix_for_any_rule(trimmed) {
                // The path could later serve as the root of a handle-relative
                // path that does reach rule scope, so the handle needs to be
                // associated with the unredirected path.
                return FileOperationInstruction::intercept_without_redirection(
                    NameAssociation::Unredirected,
                    Vec::new(),
                    String::new(),
                );
            }
            return FileOperationInstruction::no_redirection_or_interception();
        };

        let query_is_origin_directory = container.any_rule().is_some_and(|rule| {
            rule.directory_compare_with_origin(trimmed) == DirectoryComparison::Equal
        });

        let (directory_part, file_part, selected_rule) = if query_is_origin_directory {
            // The whole input is a directory path equal to the rules' shared
            // origin directory; no file part exists and no file pattern
            // matching applies. The container's first rule under its ordering
            // is used, a stable choice among co-located rules.
            (trimmed, "", container.any_rule())
        } else {
            let directory_part = &trimmed[..last_separator];
            let file_part = &trimmed[last_separator + 1..];
            let (rule, _) = container.rule_matching_file_name(file_part, 0);
            (directory_part, file_part, rule)
        };

        let Some(rule) = selected_rule else {
            info!(
                "file operation query for '{absolute_path}' did not match any rules because it does not satisfy any file patterns"
            );
            return FileOperationInstruction::no_redirection_or_interception();
        };

        let Some(redirected_path) = rule.redirect_path_origin_to_target(
            directory_part,
            file_part,
            namespace_prefix,
            trailing_suffix,
        ) else {
            error!(
                "file operation query for '{absolute_path}' did not redirect via rule '{}' due to an internal error",
                rule.name()
            );
            return FileOperationInstruction::no_redirection_or_interception();
        };

        info!(
            "file operation query for '{absolute_path}' matched rule '{}' and was redirected to '{redirected_path}'",
            rule.name()
        );

        let directory_part_is_origin =
            rule.directory_compare_with_origin(directory_part) == DirectoryComparison::Equal;
        let (extra_pre_operations, extra_pre_operation_operand) = self.compute_pre_operations(
            absolute_path,
            namespace_prefix,
            directory_part,
            directory_part_is_origin,
            &redirected_path,
            create_disposition,
        );

        if rule.redirect_mode().is_overlay() {
            // With file creation permitted, an existing origin-side file must
            // win over creating a fresh target-side file; the preference
            // encodes that for the executor.
            let preference = if create_disposition.allows_create_new_file() {
                CreateDispositionPreference::PreferOpenExistingFile
            } else {
                CreateDispositionPreference::NoPreference
            };
            FileOperationInstruction::overlay_redirect_to(
                redirected_path,
                NameAssociation::Unredirected,
                preference,
                extra_pre_operations,
                extra_pre_operation_operand,
            )
        } else {
            FileOperationInstruction::simple_redirect_to(
                redirected_path,
                NameAssociation::Unredirected,
                extra_pre_operations,
                extra_pre_operation_operand,
            )
        }
    }

    /// Pre-operations make the redirected attempt viable whenever the
    /// unredirected attempt would have been: if the operation could succeed
    /// on the origin side, the target-side ancestor directories must
    /// materialize first.
    fn compute_pre_operations(
        &self,
        absolute_path: &str,
        namespace_prefix: &str,
        directory_part: &str,
        directory_part_is_origin: bool,
        redirected_path: &str,
        create_disposition: CreateDisposition,
    ) -> (Vec<ExtraPreOperation>, String) {
        if create_disposition.allows_create_new_file() {
            let directory_part_with_prefix =
                &absolute_path[..namespace_prefix.len() + directory_part.len()];
            if directory_part_is_origin
                || self.filesystem().is_directory(directory_part_with_prefix)
            {
                let operand = path_utils::remove_trailing(
                    path_utils::parent_of(redirected_path),
                    '\\',
                );
                return (
                    vec![ExtraPreOperation::EnsurePathHierarchyExists],
                    operand.to_string(),
                );
            }
        } else if self.filesystem().is_directory(absolute_path) {
            return (
                vec![ExtraPreOperation::EnsurePathHierarchyExists],
                path_utils::remove_trailing(redirected_path, '\\').to_string(),
            );
        }
        (Vec::new(), String::new())
    }
}

#[cfg(test)]
#[path = "file_operation_tests.rs"]
mod tests;

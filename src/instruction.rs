//! Declarative instructions produced by the filesystem director.
//!
//! Instructions are pure data: they describe which real paths an executor
//! should try, what must happen first, how to associate a name with the
//! resulting handle, and how to merge directory enumerations. Equality is
//! structural, which the tests rely on heavily. Instructions borrow rules and
//! containers from the director that produced them and are valid for its
//! lifetime.

use crate::rules::{FilePatternMatchCondition, FilesystemRule, RelatedRuleContainer};

/// Possible ways of associating a filename with a newly-created file handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NameAssociation {
    /// The filename used to create the handle is not interesting.
    #[default]
    None,
    /// Whichever filename resulted in the handle's successful creation.
    WhicheverWasSuccessful,
    /// The unredirected filename.
    Unredirected,
    /// The redirected filename.
    Redirected,
}

/// Preference between creating a new file and opening an existing one when
/// the application would accept either.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CreateDispositionPreference {
    #[default]
    NoPreference,
    PreferCreateNewFile,
    PreferOpenExistingFile,
}

/// Possible ways of submitting filenames to the underlying system call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryFiles {
    UnredirectedOnly,
    UnredirectedFirst,
    RedirectedFirst,
    RedirectedOnly,
}

/// Filesystem mutations that must complete before the primary operation is
/// attempted. Order of execution is not significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraPreOperation {
    /// Ensure all directories exist up to the path given as the instruction's
    /// pre-operation operand.
    EnsurePathHierarchyExists,
}

/// Where the executor obtains the path of a directory to enumerate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DirectoryPathSource {
    /// No directory should be enumerated.
    #[default]
    None,
    /// Path internally associated with the open handle.
    AssociatedPath,
    /// Path actually submitted to the system call that opened the handle.
    RealOpenedPath,
    /// Origin directory of the pattern-source rule.
    FilePatternSourceOriginDirectory,
    /// Target directory of the pattern-source rule.
    FilePatternSourceTargetDirectory,
}

/// Describes a planned file operation, including whether and where to
/// redirect it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOperationInstruction {
    redirected_path: Option<String>,
    filenames_to_try: TryFiles,
    create_disposition_preference: CreateDispositionPreference,
    handle_association: NameAssociation,
    extra_pre_operations: Vec<ExtraPreOperation>,
    extra_pre_operation_operand: String,
}

impl FileOperationInstruction {
    /// The request should be passed to the system without redirection or
    /// interception of any kind.
    #[must_use]
    pub const fn no_redirection_or_interception() -> Self {
        Self {
            redirected_path: None,
            filenames_to_try: TryFiles::UnredirectedOnly,
            create_disposition_preference: CreateDispositionPreference::NoPreference,
            handle_association: NameAssociation::None,
            extra_pre_operations: Vec::new(),
            extra_pre_operation_operand: String::new(),
        }
    }

    /// The request should not be redirected but needs additional processing,
    /// through handle association, pre-operations, or both.
    #[must_use]
    pub const fn intercept_without_redirection(
        handle_association: NameAssociation,
        extra_pre_operations: Vec<ExtraPreOperation>,
        extra_pre_operation_operand: String,
    ) -> Self {
        Self {
            redirected_path: None,
            filenames_to_try: TryFiles::UnredirectedOnly,
            create_disposition_preference: CreateDispositionPreference::NoPreference,
            handle_association,
            extra_pre_operations,
            extra_pre_operation_operand,
        }
    }

    /// Redirect in simple mode: only the redirected path is tried.
    #[must_use]
    pub const fn simple_redirect_to(
        redirected_path: String,
        handle_association: NameAssociation,
        extra_pre_operations: Vec<ExtraPreOperation>,
        extra_pre_operation_operand: String,
    ) -> Self {
        Self {
            redirected_path: Some(redirected_path),
            filenames_to_try: TryFiles::RedirectedOnly,
            create_disposition_preference: CreateDispositionPreference::NoPreference,
            handle_association,
            extra_pre_operations,
            extra_pre_operation_operand,
        }
    }

    /// Redirect in overlay mode: the redirected path is tried first, then
    /// the unredirected path.
    #[must_use]
    pub const fn overlay_redirect_to(
        redirected_path: String,
        handle_association: NameAssociation,
        create_disposition_preference: CreateDispositionPreference,
        extra_pre_operations: Vec<ExtraPreOperation>,
        extra_pre_operation_operand: String,
    ) -> Self {
        Self {
            redirected_path: Some(redirected_path),
            filenames_to_try: TryFiles::RedirectedFirst,
            create_disposition_preference,
            handle_association,
            extra_pre_operations,
            extra_pre_operation_operand,
        }
    }

    #[must_use]
    pub fn redirected_path(&self) -> Option<&str> {
        self.redirected_path.as_deref()
    }

    #[must_use]
    pub fn has_redirected_path(&self) -> bool {
        self.redirected_path.is_some()
    }

    #[must_use]
    pub const fn filenames_to_try(&self) -> TryFiles {
        self.filenames_to_try
    }

    #[must_use]
    pub const fn create_disposition_preference(&self) -> CreateDispositionPreference {
        self.create_disposition_preference
    }

    #[must_use]
    pub const fn handle_association(&self) -> NameAssociation {
        self.handle_association
    }

    #[must_use]
    pub fn extra_pre_operations(&self) -> &[ExtraPreOperation] {
        &self.extra_pre_operations
    }

    #[must_use]
    pub fn extra_pre_operation_operand(&self) -> &str {
        &self.extra_pre_operation_operand
    }
}

/// Source of file patterns consulted while enumerating one directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternSource<'rules> {
    /// No pattern source; every file name is accepted.
    None,
    /// Patterns of a single rule.
    SingleRule(&'rules FilesystemRule),
    /// Patterns drawn from a container of co-located rules, selected
    /// according to the match condition and, where relevant, the rule index.
    RuleContainer {
        container: &'rules RelatedRuleContainer,
        condition: FilePatternMatchCondition,
        rule_index: usize,
    },
}

/// How to enumerate a single directory as one part of a larger merged
/// directory enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleDirectoryEnumeration<'rules> {
    path_source: DirectoryPathSource,
    pattern_source: PatternSource<'rules>,
    invert_matches: bool,
}

impl<'rules> SingleDirectoryEnumeration<'rules> {
    /// Enumeration that unconditionally includes every file name.
    #[must_use]
    pub const fn include_all_filenames(path_source: DirectoryPathSource) -> Self {
        Self {
            path_source,
            pattern_source: PatternSource::None,
            invert_matches: false,
        }
    }

    /// Enumeration including only names matching the rule's patterns.
    #[must_use]
    pub const fn include_only_matching_filenames(
        path_source: DirectoryPathSource,
        rule: &'rules FilesystemRule,
    ) -> Self {
        Self {
            path_source,
            pattern_source: PatternSource::SingleRule(rule),
            invert_matches: false,
        }
    }

    /// Enumeration including only names the container matches under the
    /// given condition.
    #[must_use]
    pub const fn include_only_matching_filenames_multi(
        path_source: DirectoryPathSource,
        container: &'rules RelatedRuleContainer,
        condition: FilePatternMatchCondition,
        rule_index: usize,
    ) -> Self {
        Self {
            path_source,
            pattern_source: PatternSource::RuleContainer {
                container,
                condition,
                rule_index,
            },
            invert_matches: false,
        }
    }

    /// Enumeration including only names that do not match the rule's
    /// patterns.
    #[must_use]
    pub const fn include_all_except_matching_filenames(
        path_source: DirectoryPathSource,
        rule: &'rules FilesystemRule,
    ) -> Self {
        Self {
            path_source,
            pattern_source: PatternSource::SingleRule(rule),
            invert_matches: true,
        }
    }

    /// Enumeration including only names the container does not match under
    /// the given condition.
    #[must_use]
    pub const fn include_all_except_matching_filenames_multi(
        path_source: DirectoryPathSource,
        container: &'rules RelatedRuleContainer,
        condition: FilePatternMatchCondition,
        rule_index: usize,
    ) -> Self {
        Self {
            path_source,
            pattern_source: PatternSource::RuleContainer {
                container,
                condition,
                rule_index,
            },
            invert_matches: true,
        }
    }

    #[must_use]
    pub const fn path_source(&self) -> DirectoryPathSource {
        self.path_source
    }

    #[must_use]
    pub const fn pattern_source(&self) -> PatternSource<'rules> {
        self.pattern_source
    }

    #[must_use]
    pub const fn invert_matches(&self) -> bool {
        self.invert_matches
    }

    /// Selects the absolute path of the directory to enumerate from the
    /// per-query inputs and the pattern source. An empty string results from
    /// a source of `None` or a source that requires a pattern source this
    /// instruction does not carry.
    #[must_use]
    pub fn select_directory_path<'paths>(
        &'paths self,
        associated_path: &'paths str,
        real_opened_path: &'paths str,
    ) -> &'paths str {
        match self.path_source {
            DirectoryPathSource::None => "",
            DirectoryPathSource::AssociatedPath => associated_path,
            DirectoryPathSource::RealOpenedPath => real_opened_path,
            DirectoryPathSource::FilePatternSourceOriginDirectory => self
                .pattern_source_rule()
                .map_or("", FilesystemRule::origin_directory_full_path),
            DirectoryPathSource::FilePatternSourceTargetDirectory => self
                .pattern_source_rule()
                .map_or("", FilesystemRule::target_directory_full_path),
        }
    }

    /// Determines whether `file_name` (the part after the final separator)
    /// belongs in this directory's enumeration result.
    #[must_use]
    pub fn should_include(&self, file_name: &str) -> bool {
        let matched = match self.pattern_source {
            PatternSource::None => return true,
            PatternSource::SingleRule(rule) => rule.file_name_matches_any_pattern(file_name),
            PatternSource::RuleContainer {
                container,
                condition,
                rule_index,
            } => container.has_rule_matching_file_name(file_name, condition, rule_index),
        };
        matched != self.invert_matches
    }

    fn pattern_source_rule(&self) -> Option<&'rules FilesystemRule> {
        match self.pattern_source {
            PatternSource::None => None,
            PatternSource::SingleRule(rule) => Some(rule),
            PatternSource::RuleContainer {
                container,
                rule_index,
                ..
            } => container.rule_by_index(rule_index),
        }
    }
}

/// A single directory name to be injected into an enumeration result,
/// standing in for a rule origin directory that may not exist on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleDirectoryNameInsertion<'rules> {
    rule: &'rules FilesystemRule,
}

impl<'rules> SingleDirectoryNameInsertion<'rules> {
    #[must_use]
    pub const fn new(rule: &'rules FilesystemRule) -> Self {
        Self { rule }
    }

    /// Name inserted into the enumeration result: the base name of the
    /// rule's origin directory.
    #[must_use]
    pub fn file_name_to_insert(&self) -> &'rules str {
        self.rule.origin_directory_name()
    }

    /// Absolute path supplying the metadata for the inserted entry: the
    /// rule's target directory.
    #[must_use]
    pub fn directory_information_source_path(&self) -> &'rules str {
        self.rule.target_directory_full_path()
    }

    /// Directory part of the metadata source path.
    #[must_use]
    pub fn directory_information_source_directory_part(&self) -> &'rules str {
        self.rule.target_directory_parent()
    }

    /// File part of the metadata source path.
    #[must_use]
    pub fn directory_information_source_file_part(&self) -> &'rules str {
        self.rule.target_directory_name()
    }
}

/// Describes a planned directory enumeration: which underlying directories to
/// enumerate, in order, and which rule origin directory names to inject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEnumerationInstruction<'rules> {
    directories_to_enumerate: Vec<SingleDirectoryEnumeration<'rules>>,
    directory_names_to_insert: Option<Vec<SingleDirectoryNameInsertion<'rules>>>,
}

impl<'rules> DirectoryEnumerationInstruction<'rules> {
    /// Pass the original enumeration query through without modification.
    #[must_use]
    pub fn pass_through_unmodified_query() -> Self {
        Self {
            directories_to_enumerate: vec![SingleDirectoryEnumeration::include_all_filenames(
                DirectoryPathSource::RealOpenedPath,
            )],
            directory_names_to_insert: None,
        }
    }

    /// Enumerate the given directories in order.
    #[must_use]
    pub const fn enumerate_directories(
        directories_to_enumerate: Vec<SingleDirectoryEnumeration<'rules>>,
    ) -> Self {
        Self {
            directories_to_enumerate,
            directory_names_to_insert: None,
        }
    }

    /// Enumerate the real opened directory unmodified and insert the given
    /// directory names into the result.
    #[must_use]
    pub fn insert_rule_origin_directory_names(
        directory_names_to_insert: Vec<SingleDirectoryNameInsertion<'rules>>,
    ) -> Self {
        Self {
            directories_to_enumerate: vec![SingleDirectoryEnumeration::include_all_filenames(
                DirectoryPathSource::RealOpenedPath,
            )],
            directory_names_to_insert: Some(directory_names_to_insert),
        }
    }

    /// Enumerate the given directories in order and insert the given
    /// directory names into the result.
    #[must_use]
    pub const fn enumerate_directories_and_insert_rule_origin_directory_names(
        directories_to_enumerate: Vec<SingleDirectoryEnumeration<'rules>>,
        directory_names_to_insert: Vec<SingleDirectoryNameInsertion<'rules>>,
    ) -> Self {
        Self {
            directories_to_enumerate,
            directory_names_to_insert: Some(directory_names_to_insert),
        }
    }

    /// The enumeration result consists solely of the given directory names.
    #[must_use]
    pub const fn use_only_rule_origin_directory_names(
        directory_names_to_insert: Vec<SingleDirectoryNameInsertion<'rules>>,
    ) -> Self {
        Self {
            directories_to_enumerate: Vec::new(),
            directory_names_to_insert: Some(directory_names_to_insert),
        }
    }

    #[must_use]
    pub fn directories_to_enumerate(&self) -> &[SingleDirectoryEnumeration<'rules>] {
        &self.directories_to_enumerate
    }

    #[must_use]
    pub fn directory_names_to_insert(&self) -> Option<&[SingleDirectoryNameInsertion<'rules>]> {
        self.directory_names_to_insert.as_deref()
    }

    #[must_use]
    pub const fn has_directory_names_to_insert(&self) -> bool {
        self.directory_names_to_insert.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RedirectMode;

    fn sample_rule(patterns: &[&str]) -> FilesystemRule {
        FilesystemRule::new(
            "1",
            "C:\\Origin",
            "C:\\Target",
            patterns.iter().map(ToString::to_string).collect(),
            RedirectMode::Simple,
        )
        .unwrap()
    }

    #[test]
    fn test_file_operation_factories_encode_expected_fields() {
        let neutral = FileOperationInstruction::no_redirection_or_interception();
        assert!(!neutral.has_redirected_path());
        assert_eq!(neutral.filenames_to_try(), TryFiles::UnredirectedOnly);
        assert_eq!(neutral.handle_association(), NameAssociation::None);

        let simple = FileOperationInstruction::simple_redirect_to(
            "C:\\Target\\f".to_string(),
            NameAssociation::Unredirected,
            Vec::new(),
            String::new(),
        );
        assert_eq!(simple.redirected_path(), Some("C:\\Target\\f"));
        assert_eq!(simple.filenames_to_try(), TryFiles::RedirectedOnly);

        let overlay = FileOperationInstruction::overlay_redirect_to(
            "C:\\Target\\f".to_string(),
            NameAssociation::Unredirected,
            CreateDispositionPreference::PreferOpenExistingFile,
            vec![ExtraPreOperation::EnsurePathHierarchyExists],
            "C:\\Target".to_string(),
        );
        assert_eq!(overlay.filenames_to_try(), TryFiles::RedirectedFirst);
        assert_eq!(
            overlay.create_disposition_preference(),
            CreateDispositionPreference::PreferOpenExistingFile
        );
        assert_eq!(
            overlay.extra_pre_operations(),
            &[ExtraPreOperation::EnsurePathHierarchyExists]
        );
        assert_eq!(overlay.extra_pre_operation_operand(), "C:\\Target");
    }

    #[test]
    fn test_single_directory_enumeration_should_include() {
        let rule = sample_rule(&["*.txt"]);

        let include_all =
            SingleDirectoryEnumeration::include_all_filenames(DirectoryPathSource::RealOpenedPath);
        assert!(include_all.should_include("anything"));

        let only_matching = SingleDirectoryEnumeration::include_only_matching_filenames(
            DirectoryPathSource::RealOpenedPath,
            &rule,
        );
        assert!(only_matching.should_include("a.txt"));
        assert!(!only_matching.should_include("a.bin"));

        let except_matching = SingleDirectoryEnumeration::include_all_except_matching_filenames(
            DirectoryPathSource::AssociatedPath,
            &rule,
        );
        assert!(!except_matching.should_include("a.txt"));
        assert!(except_matching.should_include("a.bin"));
    }

    #[test]
    fn test_select_directory_path() {
        let rule = sample_rule(&[]);

        let from_real =
            SingleDirectoryEnumeration::include_all_filenames(DirectoryPathSource::RealOpenedPath);
        assert_eq!(from_real.select_directory_path("C:\\A", "C:\\R"), "C:\\R");

        let from_associated =
            SingleDirectoryEnumeration::include_all_filenames(DirectoryPathSource::AssociatedPath);
        assert_eq!(
            from_associated.select_directory_path("C:\\A", "C:\\R"),
            "C:\\A"
        );

        let from_target = SingleDirectoryEnumeration::include_only_matching_filenames(
            DirectoryPathSource::FilePatternSourceTargetDirectory,
            &rule,
        );
        assert_eq!(
            from_target.select_directory_path("C:\\A", "C:\\R"),
            "C:\\Target"
        );

        let from_origin = SingleDirectoryEnumeration::include_only_matching_filenames(
            DirectoryPathSource::FilePatternSourceOriginDirectory,
            &rule,
        );
        assert_eq!(
            from_origin.select_directory_path("C:\\A", "C:\\R"),
            "C:\\Origin"
        );
    }

    #[test]
    fn test_directory_name_insertion_accessors() {
        let rule = sample_rule(&[]);
        let insertion = SingleDirectoryNameInsertion::new(&rule);
        assert_eq!(insertion.file_name_to_insert(), "Origin");
        assert_eq!(insertion.directory_information_source_path(), "C:\\Target");
        assert_eq!(insertion.directory_information_source_directory_part(), "C:");
        assert_eq!(insertion.directory_information_source_file_part(), "Target");
    }

    #[test]
    fn test_pass_through_equals_plain_real_opened_enumeration() {
        let pass_through = DirectoryEnumerationInstruction::pass_through_unmodified_query();
        let explicit = DirectoryEnumerationInstruction::enumerate_directories(vec![
            SingleDirectoryEnumeration::include_all_filenames(DirectoryPathSource::RealOpenedPath),
        ]);
        assert_eq!(pass_through, explicit);
        assert!(!pass_through.has_directory_names_to_insert());
    }
}

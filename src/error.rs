use std::fmt;

use thiserror::Error;

/// Identifies which directory of a filesystem rule an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryRole {
    Origin,
    Target,
}

impl fmt::Display for DirectoryRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Origin => write!(f, "origin"),
            Self::Target => write!(f, "target"),
        }
    }
}

#[derive(Error, Debug)]
pub enum PathwinderError {
    #[error("filesystem rule '{rule}': a rule with the same name already exists")]
    DuplicateRuleName { rule: String },

    #[error(
        "filesystem rule '{rule}': {role} directory '{path}' is empty or contains disallowed characters"
    )]
    InvalidDirectoryString {
        rule: String,
        role: DirectoryRole,
        path: String,
    },

    #[error("filesystem rule '{rule}': {role} directory '{path}' is not an absolute path")]
    DirectoryNotAbsolute {
        rule: String,
        role: DirectoryRole,
        path: String,
    },

    #[error("filesystem rule '{rule}': {role} directory cannot be a filesystem root")]
    DirectoryIsFilesystemRoot { rule: String, role: DirectoryRole },

    #[error(
        "filesystem rule '{rule}': file pattern '{pattern}' is empty or contains disallowed characters"
    )]
    InvalidFilePattern { rule: String, pattern: String },

    #[error("filesystem rule '{rule}': file pattern '{pattern}' failed to compile")]
    FilePatternCompile {
        rule: String,
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error(
        "filesystem rule '{rule}': origin directory is already in use as a target directory by another rule"
    )]
    OriginConflictsWithTarget { rule: String },

    #[error(
        "filesystem rule '{rule}': target directory is already in use as an origin directory by another rule"
    )]
    TargetConflictsWithOrigin { rule: String },

    #[error(
        "filesystem rule '{rule}': target directory is already in use by rule '{other_rule}', which has a different origin directory"
    )]
    TargetSharedAcrossOrigins { rule: String, other_rule: String },

    #[error(
        "filesystem rule '{rule}': origin directory must either not exist at all or exist as a real directory"
    )]
    OriginExistsNotAsDirectory { rule: String },

    #[error(
        "filesystem rule '{rule}': parent of origin directory must either exist as a real directory or be the origin directory of another rule"
    )]
    OriginParentMissing { rule: String },

    #[error(
        "filesystem rule '{rule}': target directory '{target}' overlaps the hierarchy of '{other}' used by rule '{other_rule}'"
    )]
    TargetHierarchyConflict {
        rule: String,
        target: String,
        other_rule: String,
        other: String,
    },

    #[error("cannot finalize a registry that contains no filesystem rules")]
    EmptyRegistry,

    #[error("configuration section for rule '{rule}' is missing required key '{key}'")]
    MissingConfigKey { rule: String, key: &'static str },

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] Box<toml::de::Error>),

    #[error("'{reference}': unparseable reference")]
    UnparseableReference { reference: String },

    #[error("'{domain}': unrecognized reference domain")]
    UnknownReferenceDomain { domain: String },

    #[error("'{domain}::{name}': unrecognized name within reference domain")]
    UnknownReferenceName { domain: String, name: String },

    #[error("'{domain}::{name}': failed to obtain a value for the reference")]
    ReferenceUnavailable { domain: String, name: String },

    #[error("'{reference}': circular reference (chain: {})", chain.join(" -> "))]
    CircularReference {
        reference: String,
        chain: Vec<String>,
    },

    #[error("'{text}': unmatched '%' delimiters")]
    UnmatchedReferenceDelimiters { text: String },

    #[error("'{text}': failed to resolve reference")]
    ReferenceExpansion {
        text: String,
        #[source]
        source: Box<PathwinderError>,
    },

    #[error(
        "'{text}': successfully resolved, but the result exceeds the limit of {limit} characters"
    )]
    ResolvedStringTooLong { text: String, limit: usize },

    #[error("path '{path}': a '..' component escapes the filesystem root")]
    RelativePathEscapesRoot { path: String },
}

impl PathwinderError {
    /// Returns the error type as a short string identifier.
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::DuplicateRuleName { .. }
            | Self::InvalidDirectoryString { .. }
            | Self::DirectoryNotAbsolute { .. }
            | Self::DirectoryIsFilesystemRoot { .. }
            | Self::InvalidFilePattern { .. }
            | Self::FilePatternCompile { .. }
            | Self::OriginConflictsWithTarget { .. }
            | Self::TargetConflictsWithOrigin { .. }
            | Self::TargetSharedAcrossOrigins { .. }
            | Self::OriginExistsNotAsDirectory { .. }
            | Self::OriginParentMissing { .. }
            | Self::TargetHierarchyConflict { .. }
            | Self::EmptyRegistry => "RuleConstraint",
            Self::MissingConfigKey { .. } | Self::TomlParse(_) => "Config",
            Self::UnparseableReference { .. }
            | Self::UnknownReferenceDomain { .. }
            | Self::UnknownReferenceName { .. }
            | Self::ReferenceUnavailable { .. }
            | Self::CircularReference { .. }
            | Self::UnmatchedReferenceDelimiters { .. }
            | Self::ReferenceExpansion { .. }
            | Self::ResolvedStringTooLong { .. } => "Resolution",
            Self::RelativePathEscapesRoot { .. } => "Path",
        }
    }

    /// True for errors raised while expanding `%DOMAIN::NAME%` references.
    #[must_use]
    pub fn is_resolution_error(&self) -> bool {
        self.error_type() == "Resolution"
    }
}

pub type Result<T> = std::result::Result<T, PathwinderError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

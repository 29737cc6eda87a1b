//! Filesystem rules and containers of rules sharing an origin directory.

mod container;
mod rule;

pub use container::{FilePatternMatchCondition, RelatedRuleContainer};
pub use rule::{
    DirectoryComparison, FilePattern, FilesystemRule, RedirectMode, compare_directories,
};

use crate::filesystem::mock::MockFileSystem;
use crate::path_utils;
use crate::resolver::{MockEnvironment, Resolver};
use crate::rules::RedirectMode;

use super::{DirectorBuilder, FilesystemDirector};

/// Rule description for test directors: name, origin, target, patterns,
/// redirect mode.
pub(crate) type RuleSpec<'a> = (&'a str, &'a str, &'a str, &'a [&'a str], RedirectMode);

/// Shorthand for a simple-mode rule without file patterns.
pub(crate) const fn simple<'a>(name: &'a str, origin: &'a str, target: &'a str) -> RuleSpec<'a> {
    (name, origin, target, &[], RedirectMode::Simple)
}

/// Builds a director over a mock filesystem. Each origin directory's parent
/// is seeded into the filesystem unless it is itself the origin directory of
/// another rule, which keeps the builder's hierarchy constraints satisfied
/// without giving any origin or target directory real existence.
pub(crate) fn make_director(
    rules: &[RuleSpec<'_>],
    mut filesystem: MockFileSystem,
) -> FilesystemDirector<MockFileSystem> {
    for (_, origin, _, _, _) in rules {
        let parent = path_utils::parent_of(origin);
        let parent_is_origin = rules
            .iter()
            .any(|(_, other_origin, _, _, _)| path_utils::eq_case_insensitive(other_origin, parent));
        if !parent.is_empty() && !parent_is_origin {
            filesystem.add_directory(parent);
        }
    }

    let mut builder =
        DirectorBuilder::with_components(filesystem, Resolver::with_environment(MockEnvironment::new()));
    for (name, origin, target, patterns, mode) in rules {
        builder
            .add_rule(
                name,
                origin,
                target,
                patterns.iter().map(ToString::to_string).collect(),
                *mode,
            )
            .unwrap();
    }
    builder.build().unwrap()
}

/// Builds a director from rules over an empty mock filesystem.
pub(crate) fn make_simple_director(
    rules: &[RuleSpec<'_>],
) -> FilesystemDirector<MockFileSystem> {
    make_director(rules, MockFileSystem::new())
}

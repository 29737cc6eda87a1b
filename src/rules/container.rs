//! Ordered set of rules sharing an origin directory.

use std::cmp::Ordering;

use crate::path_utils;

use super::rule::FilesystemRule;

/// How to choose rules within a container when checking a file name for a
/// pattern match during directory enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilePatternMatchCondition {
    /// Only the rule at the configured index is consulted.
    SingleRuleOnly,
    /// Any rule matching counts as a match.
    MatchAny,
    /// A name matches when some rule not in overlay mode matches it; overlay
    /// rules' matches are inverted so their names stay visible on the origin
    /// side.
    MatchByRedirectModeInvertOverlay,
    /// A name matches only when the first-matching rule, scanning from
    /// position zero, sits exactly at the configured index. A match at any
    /// prior position suppresses this one, partitioning the namespace across
    /// co-located rules.
    MatchByPositionInvertAllPriorToSelected,
}

/// Rules sharing an origin directory, held in a deterministic order: more
/// file patterns first (more specific rules win scans), rule name as the
/// tiebreaker. A rule's position is its "rule index".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelatedRuleContainer {
    rules: Vec<FilesystemRule>,
}

impl RelatedRuleContainer {
    #[must_use]
    pub const fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Inserts a rule at its ordered position. Returns `false`, leaving the
    /// container unchanged, if a rule with the same name is already present.
    pub fn insert(&mut self, rule: FilesystemRule) -> bool {
        if self.rule_named(rule.name()).is_some() {
            return false;
        }
        let position = self
            .rules
            .iter()
            .position(|existing| Self::order(&rule, existing) == Ordering::Less)
            .unwrap_or(self.rules.len());
        self.rules.insert(position, rule);
        true
    }

    fn order(a: &FilesystemRule, b: &FilesystemRule) -> Ordering {
        b.file_pattern_count()
            .cmp(&a.file_pattern_count())
            .then_with(|| path_utils::compare_case_insensitive(a.name(), b.name()))
            .then_with(|| a.name().cmp(b.name()))
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterates over the contained rules in order.
    pub fn all_rules(&self) -> impl Iterator<Item = &FilesystemRule> {
        self.rules.iter()
    }

    /// Rule at the given index under the container's ordering.
    #[must_use]
    pub fn rule_by_index(&self, rule_index: usize) -> Option<&FilesystemRule> {
        self.rules.get(rule_index)
    }

    /// Some rule from the container: the first under its ordering. Intended
    /// for directory-level redirection, where all contained rules agree on
    /// the origin directory.
    #[must_use]
    pub fn any_rule(&self) -> Option<&FilesystemRule> {
        self.rules.first()
    }

    /// Rule with the given name, compared case-insensitively.
    #[must_use]
    pub fn rule_named(&self, name: &str) -> Option<&FilesystemRule> {
        self.rules
            .iter()
            .find(|rule| path_utils::eq_case_insensitive(rule.name(), name))
    }

    /// The origin directory all contained rules share.
    #[must_use]
    pub fn origin_directory(&self) -> Option<&str> {
        self.any_rule().map(FilesystemRule::origin_directory_full_path)
    }

    /// Scans from `starting_index` for the first rule whose patterns match
    /// `file_name`. The returned index identifies the match, or the end of
    /// the container if there is none, so a caller can resume a scan.
    #[must_use]
    pub fn rule_matching_file_name(
        &self,
        file_name: &str,
        starting_index: usize,
    ) -> (Option<&FilesystemRule>, usize) {
        for (index, rule) in self.rules.iter().enumerate().skip(starting_index) {
            if rule.file_name_matches_any_pattern(file_name) {
                return (Some(rule), index);
            }
        }
        (None, self.rules.len())
    }

    /// Checks `file_name` against the container under the given match
    /// condition. `rule_index` is consulted only by the conditions that
    /// single out one position.
    #[must_use]
    pub fn has_rule_matching_file_name(
        &self,
        file_name: &str,
        condition: FilePatternMatchCondition,
        rule_index: usize,
    ) -> bool {
        match condition {
            FilePatternMatchCondition::SingleRuleOnly => self
                .rule_by_index(rule_index)
                .is_some_and(|rule| rule.file_name_matches_any_pattern(file_name)),
            FilePatternMatchCondition::MatchAny => self
                .rules
                .iter()
                .any(|rule| rule.file_name_matches_any_pattern(file_name)),
            FilePatternMatchCondition::MatchByRedirectModeInvertOverlay => {
                self.rules.iter().any(|rule| {
                    !rule.redirect_mode().is_overlay()
                        && rule.file_name_matches_any_pattern(file_name)
                })
            }
            FilePatternMatchCondition::MatchByPositionInvertAllPriorToSelected => {
                let prior_match = self.rules[..rule_index.min(self.rules.len())]
                    .iter()
                    .any(|rule| rule.file_name_matches_any_pattern(file_name));
                !prior_match
                    && self
                        .rule_by_index(rule_index)
                        .is_some_and(|rule| rule.file_name_matches_any_pattern(file_name))
            }
        }
    }
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;

use super::*;

fn rule_with_patterns(patterns: &[&str]) -> FilesystemRule {
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
fn test_construction_canonicalizes_directories() {
    let rule = FilesystemRule::new(
        "1",
        "\\??\\C:\\Origin\\",
        "C:\\Target\\\\",
        Vec::new(),
        RedirectMode::Simple,
    )
    .unwrap();
    assert_eq!(rule.origin_directory_full_path(), "C:\\Origin");
    assert_eq!(rule.target_directory_full_path(), "C:\\Target");
}

#[test]
fn test_directory_name_and_parent_accessors() {
    let rule = rule_with_patterns(&[]);
    assert_eq!(rule.origin_directory_name(), "Origin");
    assert_eq!(rule.origin_directory_parent(), "C:");
    assert_eq!(rule.target_directory_name(), "Target");
    assert_eq!(rule.target_directory_parent(), "C:");
}

#[test]
fn test_no_patterns_matches_everything() {
    let rule = rule_with_patterns(&[]);
    assert!(!rule.has_file_patterns());
    assert!(rule.file_name_matches_any_pattern("file.txt"));
    assert!(rule.file_name_matches_any_pattern(""));
}

#[test]
fn test_universal_wildcard_patterns_are_recorded_as_none() {
    for patterns in [&["*"][..], &["**"][..], &["*", "**"][..]] {
        let rule = rule_with_patterns(patterns);
        assert!(!rule.has_file_patterns(), "patterns {patterns:?}");
        assert!(rule.file_name_matches_any_pattern("anything.at.all"));
    }
}

#[test]
fn test_pattern_matching_star() {
    let rule = rule_with_patterns(&["file*.txt", "*.bin"]);
    assert!(rule.has_file_patterns());
    assert!(rule.file_name_matches_any_pattern("file1.txt"));
    assert!(rule.file_name_matches_any_pattern("file.txt"));
    assert!(rule.file_name_matches_any_pattern("data.bin"));
    assert!(!rule.file_name_matches_any_pattern("asdf.txt"));
    assert!(!rule.file_name_matches_any_pattern("file1.dat"));
}

#[test]
fn test_pattern_matching_question_mark() {
    let rule = rule_with_patterns(&["file???.dat"]);
    assert!(rule.file_name_matches_any_pattern("fileasd.dat"));
    assert!(!rule.file_name_matches_any_pattern("fileab.dat"));
    assert!(!rule.file_name_matches_any_pattern("fileabcd.dat"));
}

#[test]
fn test_pattern_matching_is_case_insensitive() {
    let rule = rule_with_patterns(&["*.TXT"]);
    assert!(rule.file_name_matches_any_pattern("file.txt"));
    assert!(rule.file_name_matches_any_pattern("FILE.TXT"));
}

#[test]
fn test_directory_compare_with_origin() {
    let rule = rule_with_patterns(&[]);
    assert_eq!(
        rule.directory_compare_with_origin("C:\\Origin"),
        DirectoryComparison::Equal
    );
    assert_eq!(
        rule.directory_compare_with_origin("c:\\ORIGIN"),
        DirectoryComparison::Equal
    );
    assert_eq!(
        rule.directory_compare_with_origin("C:\\Origin\\Subdir"),
        DirectoryComparison::CandidateIsChild
    );
    assert_eq!(
        rule.directory_compare_with_origin("C:\\Origin\\Subdir\\Deeper"),
        DirectoryComparison::CandidateIsDescendant
    );
    assert_eq!(
        rule.directory_compare_with_origin("C:"),
        DirectoryComparison::CandidateIsParent
    );
    assert_eq!(
        rule.directory_compare_with_origin("C:\\OriginOther"),
        DirectoryComparison::Unrelated
    );
    assert_eq!(
        rule.directory_compare_with_origin("D:\\Origin"),
        DirectoryComparison::Unrelated
    );
}

#[test]
fn test_directory_compare_ancestor() {
    let rule = FilesystemRule::new(
        "1",
        "C:\\Level1\\Level2\\Origin",
        "C:\\Target",
        Vec::new(),
        RedirectMode::Simple,
    )
    .unwrap();
    assert_eq!(
        rule.directory_compare_with_origin("C:\\Level1"),
        DirectoryComparison::CandidateIsAncestor
    );
    assert_eq!(
        rule.directory_compare_with_origin("C:\\Level1\\Level2"),
        DirectoryComparison::CandidateIsParent
    );
}

#[test]
fn test_redirect_origin_to_target_nominal() {
    let rule = rule_with_patterns(&[]);
    assert_eq!(
        rule.redirect_path_origin_to_target("C:\\Origin", "file.txt", "", "")
            .unwrap(),
        "C:\\Target\\file.txt"
    );
    assert_eq!(
        rule.redirect_path_origin_to_target("C:\\Origin\\Subdir", "file.txt", "", "")
            .unwrap(),
        "C:\\Target\\Subdir\\file.txt"
    );
}

#[test]
fn test_redirect_origin_to_target_empty_file_part() {
    let rule = rule_with_patterns(&[]);
    assert_eq!(
        rule.redirect_path_origin_to_target("C:\\Origin", "", "", "")
            .unwrap(),
        "C:\\Target"
    );
    assert_eq!(
        rule.redirect_path_origin_to_target("C:\\Origin", "", "", "\\")
            .unwrap(),
        "C:\\Target\\"
    );
}

#[test]
fn test_redirect_origin_to_target_preserves_namespace_prefix() {
    let rule = rule_with_patterns(&[]);
    assert_eq!(
        rule.redirect_path_origin_to_target("C:\\Origin", "file.txt", "\\??\\", "")
            .unwrap(),
        "\\??\\C:\\Target\\file.txt"
    );
}

#[test]
fn test_redirect_origin_to_target_case_insensitive_prefix() {
    let rule = rule_with_patterns(&[]);
    assert_eq!(
        rule.redirect_path_origin_to_target("c:\\origin\\Sub", "f", "", "")
            .unwrap(),
        "C:\\Target\\Sub\\f"
    );
}

#[test]
fn test_redirect_origin_to_target_out_of_scope() {
    let rule = rule_with_patterns(&[]);
    assert!(
        rule.redirect_path_origin_to_target("C:\\Other", "file.txt", "", "")
            .is_none()
    );
    assert!(rule.redirect_path_origin_to_target("C:", "", "", "").is_none());
}

#[test]
fn test_redirect_origin_to_target_over_length() {
    let rule = rule_with_patterns(&[]);
    let long_file_part = "a".repeat(4096);
    assert!(
        rule.redirect_path_origin_to_target("C:\\Origin", &long_file_part, "", "")
            .is_none()
    );
}

#[test]
fn test_redirect_target_to_origin() {
    let rule = rule_with_patterns(&[]);
    assert_eq!(
        rule.redirect_path_target_to_origin("C:\\Target\\Subdir", "file.txt", "", "")
            .unwrap(),
        "C:\\Origin\\Subdir\\file.txt"
    );
    assert!(
        rule.redirect_path_target_to_origin("C:\\Origin", "file.txt", "", "")
            .is_none()
    );
}

#[test]
fn test_redirect_mode_overlay_classification() {
    assert!(!RedirectMode::Simple.is_overlay());
    assert!(RedirectMode::Overlay.is_overlay());
    assert!(RedirectMode::OverlayCopyOnWrite.is_overlay());
}

#[test]
fn test_rule_equality_is_structural() {
    let a = rule_with_patterns(&["*.txt"]);
    let b = rule_with_patterns(&["*.txt"]);
    let c = rule_with_patterns(&["*.bin"]);
    assert_eq!(a, b);
    assert_ne!(a, c);
}

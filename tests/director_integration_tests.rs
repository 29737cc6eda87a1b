//! End-to-end coverage of the public API: configuration in, instructions
//! out.

mod common;

use common::{TestEnvironment, TestFileSystem};
use pathwinder::config::Config;
use pathwinder::director::{CreateDisposition, DirectorBuilder, FileAccessMode};
use pathwinder::instruction::{
    CreateDispositionPreference, NameAssociation, SingleDirectoryNameInsertion, TryFiles,
};
use pathwinder::resolver::Resolver;
use pathwinder::rules::RedirectMode;

fn builder_over(
    directories: &[&str],
) -> DirectorBuilder<TestFileSystem, TestEnvironment> {
    let mut filesystem = TestFileSystem::new();
    for directory in directories {
        filesystem.add_directory(directory);
    }
    DirectorBuilder::with_components(
        filesystem,
        Resolver::with_environment(TestEnvironment::new()),
    )
}

#[test]
fn simple_redirect_end_to_end() {
    let mut builder = builder_over(&["C:"]);
    builder
        .add_rule("R1", "C:\\Origin1", "C:\\Target1", Vec::new(), RedirectMode::Simple)
        .unwrap();
    let director = builder.build().unwrap();

    let instruction = director.instruction_for_file_operation(
        "C:\\Origin1\\file1.txt",
        FileAccessMode::read_only(),
        CreateDisposition::open_existing_file(),
    );
    assert_eq!(instruction.redirected_path(), Some("C:\\Target1\\file1.txt"));
    assert_eq!(instruction.filenames_to_try(), TryFiles::RedirectedOnly);
    assert_eq!(instruction.handle_association(), NameAssociation::Unredirected);
    assert!(instruction.extra_pre_operations().is_empty());
}

#[test]
fn most_specific_rule_wins() {
    let mut builder = builder_over(&["C:\\Origin1"]);
    builder
        .add_rule("R1", "C:\\Origin1", "C:\\Target1", Vec::new(), RedirectMode::Simple)
        .unwrap();
    builder
        .add_rule("R2", "C:\\Origin1\\Origin2", "C:\\Target2", Vec::new(), RedirectMode::Simple)
        .unwrap();
    let director = builder.build().unwrap();

    let container = director
        .select_rules_for_path("C:\\Origin1\\Origin2\\file.txt")
        .unwrap();
    assert_eq!(container.any_rule().unwrap().name(), "R2");
}

#[test]
fn overlay_with_create_prefers_existing_file() {
    let mut builder = builder_over(&["C:"]);
    builder
        .add_rule("R1", "C:\\O", "C:\\T", Vec::new(), RedirectMode::Overlay)
        .unwrap();
    let director = builder.build().unwrap();

    let instruction = director.instruction_for_file_operation(
        "C:\\O\\f",
        FileAccessMode::read_only(),
        CreateDisposition::create_new_or_open_existing_file(),
    );
    assert_eq!(instruction.redirected_path(), Some("C:\\T\\f"));
    assert_eq!(instruction.filenames_to_try(), TryFiles::RedirectedFirst);
    assert_eq!(instruction.handle_association(), NameAssociation::Unredirected);
    assert_eq!(
        instruction.create_disposition_preference(),
        CreateDispositionPreference::PreferOpenExistingFile
    );
}

#[test]
fn ancestor_of_origin_is_intercepted_without_redirection() {
    let mut builder = builder_over(&["C:\\Base"]);
    builder
        .add_rule("R1", "C:\\Base\\Origin", "C:\\Base\\Target", Vec::new(), RedirectMode::Simple)
        .unwrap();
    let director = builder.build().unwrap();

    let instruction = director.instruction_for_file_operation(
        "C:\\Base",
        FileAccessMode::read_only(),
        CreateDisposition::open_existing_file(),
    );
    assert!(!instruction.has_redirected_path());
    assert_eq!(instruction.filenames_to_try(), TryFiles::UnredirectedOnly);
    assert_eq!(instruction.handle_association(), NameAssociation::Unredirected);

    assert!(director.is_prefix_for_any_rule("C:\\Base"));
    assert!(!director.is_prefix_for_any_rule("C:\\Elsewhere"));
}

#[test]
fn enumeration_inserts_child_origin_names_sorted() {
    let mut builder = builder_over(&["C:\\O"]);
    builder
        .add_rule("R1", "C:\\O", "C:\\T", Vec::new(), RedirectMode::Simple)
        .unwrap();
    builder
        .add_rule("R3", "C:\\O\\SubB", "C:\\TB", Vec::new(), RedirectMode::Simple)
        .unwrap();
    builder
        .add_rule("R2", "C:\\O\\SubA", "C:\\TA", Vec::new(), RedirectMode::Simple)
        .unwrap();
    let director = builder.build().unwrap();

    let instruction = director.instruction_for_directory_enumeration("C:\\O", "C:\\T");
    let inserted: Vec<&str> = instruction
        .directory_names_to_insert()
        .unwrap()
        .iter()
        .map(SingleDirectoryNameInsertion::file_name_to_insert)
        .collect();
    assert_eq!(inserted, vec!["SubA", "SubB"]);
}

// Three rules share one origin directory with distinct patterns. The
// generated instruction partitions the namespace across them, and because
// every rule carries patterns, a final origin-side entry keeps out-of-scope
// files visible. The instruction is then exercised the way an executor
// would, by asking each entry which file names it accepts.
#[test]
fn shared_origin_enumeration_partitions_namespace() {
    let mut builder = builder_over(&["C:"]);
    builder
        .add_rule(
            "R1",
            "C:\\Origin",
            "C:\\T1",
            vec!["*.txt".to_string()],
            RedirectMode::Simple,
        )
        .unwrap();
    builder
        .add_rule(
            "R2",
            "C:\\Origin",
            "C:\\T2",
            vec!["*.bin".to_string()],
            RedirectMode::Simple,
        )
        .unwrap();
    builder
        .add_rule(
            "R3",
            "C:\\Origin",
            "C:\\T3",
            vec!["*.txt".to_string(), "*.log".to_string()],
            RedirectMode::Simple,
        )
        .unwrap();
    let director = builder.build().unwrap();

    let instruction = director.instruction_for_directory_enumeration("C:\\Origin", "C:\\T1");
    let entries = instruction.directories_to_enumerate();
    // One entry per rule plus the origin-side entry.
    assert_eq!(entries.len(), 4);

    // Container order: R3 (two patterns) first, then R1, then R2. A name
    // matching several rules is claimed by the earliest position only.
    let accepted_by = |file_name: &str| -> Vec<usize> {
        entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.should_include(file_name))
            .map(|(index, _)| index)
            .collect()
    };
    assert_eq!(accepted_by("notes.txt"), vec![0]);
    assert_eq!(accepted_by("trace.log"), vec![0]);
    assert_eq!(accepted_by("data.bin"), vec![2]);
    assert_eq!(accepted_by("other.dat"), vec![3]);

    let paths: Vec<&str> = entries
        .iter()
        .map(|entry| entry.select_directory_path("C:\\Origin", "C:\\T1"))
        .collect();
    assert_eq!(paths, vec!["C:\\T3", "C:\\T1", "C:\\T2", "C:\\Origin"]);
}

#[test]
fn resolver_cycle_fails_then_unrelated_references_resolve() {
    let mut resolver = Resolver::with_environment(
        TestEnvironment::new().with_env_var("COMPUTERNAME", "TESTHOST"),
    );
    resolver.set_definitions([("A", "%CONF::B%"), ("B", "%CONF::A%")]);

    assert!(resolver.resolve_single_reference("CONF::A").is_err());
    assert_eq!(
        resolver.resolve_single_reference("ENV::COMPUTERNAME").unwrap(),
        "TESTHOST"
    );
}

#[test]
fn config_document_to_instructions() {
    let config = Config::from_toml_str(
        r#"
[definitions]
StorageRoot = "C:\\Storage"

[rules.SaveData]
origin_directory = "C:\\Games\\SaveData"
target_directory = "%CONF::StorageRoot%\\Saves"
file_patterns = "*.sav"
"#,
    )
    .unwrap();

    let mut builder = builder_over(&["C:\\Games"]);
    builder.add_rules_from_config(&config).unwrap();
    let director = builder.build().unwrap();

    let redirected = director.instruction_for_file_operation(
        "C:\\Games\\SaveData\\slot1.sav",
        FileAccessMode::read_write(),
        CreateDisposition::open_existing_file(),
    );
    assert_eq!(
        redirected.redirected_path(),
        Some("C:\\Storage\\Saves\\slot1.sav")
    );

    let ignored = director.instruction_for_file_operation(
        "C:\\Games\\SaveData\\readme.txt",
        FileAccessMode::read_only(),
        CreateDisposition::open_existing_file(),
    );
    assert!(!ignored.has_redirected_path());
}

// tests/enumerate_glob.rs

mod common;

use common::{create_file, project_dir};
use rulewalk::errors::Error;
use rulewalk::{FileAndConfig, FileEnumerator};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn enumerator(root: &Path) -> FileEnumerator {
    FileEnumerator::builder()
        .cwd(root)
        .home_dir(root.join("__no_home__"))
        .build()
        .unwrap()
}

fn collect_ok(enumerator: &FileEnumerator, patterns: &[&str]) -> Vec<FileAndConfig> {
    enumerator
        .iterate_files(patterns)
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn paths(entries: &[FileAndConfig]) -> Vec<PathBuf> {
    entries.iter().map(|e| e.file_path.clone()).collect()
}

fn simple_project(root: &Path) {
    create_file(
        root,
        ".rulewalkrc.json",
        r#"{ "rules": { "dead-code": "error", "unused-import": "error" } }"#,
    );
    create_file(root, "lib/one.rs", "fn one() {}\n");
    create_file(root, "lib/two.rs", "fn two() {}\n");
}

#[test]
fn simple_glob_yields_matching_files_with_shared_config() {
    let (_temp, root) = project_dir();
    simple_project(&root);

    let enumerator = enumerator(&root);
    let entries = collect_ok(&enumerator, &["lib/*.rs"]);

    assert_eq!(
        paths(&entries),
        vec![root.join("lib/one.rs"), root.join("lib/two.rs")]
    );
    assert!(Arc::ptr_eq(&entries[0].config, &entries[1].config));
    assert_eq!(entries[0].config.len(), 1);
    assert_eq!(
        entries[0].config[0].file_path.as_deref(),
        Some(root.join(".rulewalkrc.json").as_path())
    );
    assert!(entries.iter().all(|e| !e.ignored));
}

#[test]
fn directory_pattern_walks_by_extension() {
    let (_temp, root) = project_dir();
    simple_project(&root);
    create_file(&root, "lib/notes.txt", "not a target\n");

    let enumerator = enumerator(&root);
    let entries = collect_ok(&enumerator, &["lib"]);
    assert_eq!(
        paths(&entries),
        vec![root.join("lib/one.rs"), root.join("lib/two.rs")]
    );
}

#[test]
fn repeated_pattern_yields_the_same_sequence() {
    let (_temp, root) = project_dir();
    simple_project(&root);

    let enumerator = enumerator(&root);
    let once = paths(&collect_ok(&enumerator, &["lib/*.rs"]));
    let twice = paths(&collect_ok(&enumerator, &["lib/*.rs", "lib/*.rs"]));
    assert_eq!(once, twice);
}

#[test]
fn overlapping_patterns_deduplicate_first_seen_wins() {
    let (_temp, root) = project_dir();
    simple_project(&root);

    let enumerator = enumerator(&root);
    let entries = collect_ok(&enumerator, &["lib/two.rs", "lib/*.rs"]);
    assert_eq!(
        paths(&entries),
        vec![root.join("lib/two.rs"), root.join("lib/one.rs")]
    );
}

#[test]
fn empty_string_patterns_are_dropped_silently() {
    let (_temp, root) = project_dir();
    simple_project(&root);

    let enumerator = enumerator(&root);
    let with_empty = paths(&collect_ok(&enumerator, &["", "lib/*.rs"]));
    let without = paths(&collect_ok(&enumerator, &["lib/*.rs"]));
    assert_eq!(with_empty, without);

    // An empty list yields nothing and does not fail.
    let entries: Vec<_> = enumerator.iterate_files(&[""]).collect();
    assert!(entries.is_empty());
}

#[test]
fn unmatched_pattern_fails_with_no_files_found() {
    let (_temp, root) = project_dir();
    simple_project(&root);

    let enumerator = enumerator(&root);
    let results: Vec<_> = enumerator.iterate_files("nope/*.rs").collect();
    assert_eq!(results.len(), 1);
    match results.into_iter().next().unwrap() {
        Err(Error::NoFilesFound {
            pattern,
            glob_disabled,
        }) => {
            assert_eq!(pattern, "nope/*.rs");
            assert!(!glob_disabled);
        }
        other => panic!("expected NoFilesFound, got {other:?}"),
    }

    let results: Vec<_> = enumerator.iterate_files("missing.rs").collect();
    assert!(matches!(
        results.into_iter().next().unwrap(),
        Err(Error::NoFilesFound { .. })
    ));
}

#[test]
fn earlier_patterns_yield_before_a_later_failure() {
    let (_temp, root) = project_dir();
    simple_project(&root);

    let enumerator = enumerator(&root);
    let results: Vec<_> = enumerator
        .iterate_files(&["lib/one.rs", "nope/*.rs"])
        .collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(Error::NoFilesFound { .. })));
}

#[test]
fn disabled_glob_reports_the_disabled_flag_only_for_missing_literals() {
    let (_temp, root) = project_dir();
    simple_project(&root);

    let enumerator = FileEnumerator::builder()
        .cwd(&root)
        .home_dir(root.join("__no_home__"))
        .glob_input_paths(false)
        .build()
        .unwrap();

    // A glob-shaped pattern that does not exist literally.
    let results: Vec<_> = enumerator.iterate_files("lib/*.rs").collect();
    match results.into_iter().next().unwrap() {
        Err(err @ Error::NoFilesFound {
            glob_disabled: true,
            ..
        }) => {
            assert!(err.to_string().ends_with("(glob was disabled)."));
        }
        other => panic!("expected NoFilesFound with glob_disabled, got {other:?}"),
    }

    // Literal paths still work with globbing off.
    let entries = collect_ok(&enumerator, &["lib/one.rs"]);
    assert_eq!(paths(&entries), vec![root.join("lib/one.rs")]);
}

#[test]
fn iteration_is_lazy_until_pulled() {
    let (_temp, root) = project_dir();
    simple_project(&root);

    let enumerator = enumerator(&root);
    let mut iterator = enumerator.iterate_files("lib/*.rs");
    let first = iterator.next().unwrap().unwrap();
    assert_eq!(first.file_path, root.join("lib/one.rs"));
    // Dropping the iterator here abandons the rest of the walk.
    drop(iterator);
}

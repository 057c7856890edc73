//! End-to-end tests for the graft pipeline, driven through the library
//! entry point.
//!
//! Each test builds a small workspace in a temp directory, runs
//! [`run_graft`], and inspects both the returned report and the actual
//! files on disk. Failure tests additionally assert that the destination
//! was left byte-for-byte untouched.

use std::fs;
use std::path::{Path, PathBuf};

use indoc::indoc;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use pygraft::cli::{run_graft, GraftReport, GraftRequest};
use pygraft::error::{GraftError, OutputErrorCode};
use pygraft::scan::Context;

// ============================================================================
// Test Helpers
// ============================================================================

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn read_file(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

/// Sorted file names in a directory, for exact-listing assertions.
fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn graft(src: &Path, dest: &Path, delete_old: bool) -> Result<GraftReport, GraftError> {
    run_graft(&GraftRequest {
        src_file: src.to_path_buf(),
        dest_file: dest.to_path_buf(),
        delete_old,
    })
}

// ============================================================================
// Successful Grafts
// ============================================================================

#[test]
fn replaces_module_function_and_keeps_backup() {
    let temp = TempDir::new().unwrap();
    let dest_text = indoc! {r#"
        import math


        GREETING_PREFIX = "Hi"


        def farewell(name):
            return f"Bye, {name}."


        def greet(name):
            print("Hello, " + name)
    "#};
    let dest = write_file(temp.path(), "app.py", dest_text);
    let src = write_file(
        temp.path(),
        "scratch.py",
        indoc! {r#"
            def greet(name):
                print(f"Hello, {name}!")
        "#},
    );

    let report = graft(&src, &dest, false).unwrap();

    assert_eq!(
        read_file(&dest),
        indoc! {r#"
            import math


            GREETING_PREFIX = "Hi"


            def farewell(name):
                return f"Bye, {name}."


            def greet(name):
                print(f"Hello, {name}!")
        "#}
    );

    assert_eq!(report.source, src);
    assert_eq!(report.destination, dest);
    assert_eq!(report.replaced.len(), 1);
    assert_eq!(report.replaced[0].name, "greet");
    assert_eq!(report.replaced[0].context, Context::Module);
    assert_eq!(report.replaced[0].line, 11);

    let backup = report.backup.unwrap();
    assert_eq!(backup, temp.path().join("app_OLD.py"));
    assert_eq!(read_file(&backup), dest_text);

    assert_eq!(file_names(temp.path()), ["app.py", "app_OLD.py", "scratch.py"]);
}

#[test]
fn delete_old_leaves_no_backup() {
    let temp = TempDir::new().unwrap();
    let dest = write_file(
        temp.path(),
        "app.py",
        indoc! {r#"
            def greet(name):
                print("Hello, " + name)
        "#},
    );
    let src = write_file(
        temp.path(),
        "scratch.py",
        indoc! {r#"
            def greet(name):
                print(f"Hello, {name}!")
        "#},
    );

    let report = graft(&src, &dest, true).unwrap();

    assert_eq!(report.backup, None);
    assert!(read_file(&dest).contains(r#"print(f"Hello, {name}!")"#));
    assert_eq!(file_names(temp.path()), ["app.py", "scratch.py"]);
}

#[test]
fn backup_name_is_uniquified_without_clobbering() {
    let temp = TempDir::new().unwrap();
    let dest = write_file(
        temp.path(),
        "app.py",
        indoc! {r#"
            def greet(name):
                print("Hello, " + name)
        "#},
    );
    let src = write_file(
        temp.path(),
        "scratch.py",
        indoc! {r#"
            def greet(name):
                print(f"Hello, {name}!")
        "#},
    );
    write_file(temp.path(), "app_OLD.py", "stale backup\n");

    let report = graft(&src, &dest, false).unwrap();

    assert_eq!(report.backup, Some(temp.path().join("app_OLD_0.py")));
    assert_eq!(read_file(&temp.path().join("app_OLD.py")), "stale backup\n");
    assert!(read_file(&temp.path().join("app_OLD_0.py")).contains(r#"print("Hello, " + name)"#));
    assert_eq!(
        file_names(temp.path()),
        ["app.py", "app_OLD.py", "app_OLD_0.py", "scratch.py"]
    );
}

#[test]
fn method_replacement_respects_class_scope() {
    let temp = TempDir::new().unwrap();
    let dest = write_file(
        temp.path(),
        "shapes.py",
        indoc! {r#"
            def area(self):
                return 0


            class Square:
                def __init__(self, side):
                    self.side = side

                def area(self):
                    return self.side * 2


            class Circle:
                def area(self):
                    return 3
        "#},
    );
    let src = write_file(
        temp.path(),
        "fix.py",
        indoc! {r#"
            class Square:
                def area(self):
                    return self.side ** 2
        "#},
    );

    let report = graft(&src, &dest, true).unwrap();

    assert_eq!(report.replaced.len(), 1);
    assert_eq!(
        report.replaced[0].context,
        Context::Class {
            name: "Square".into(),
            bases: None,
        }
    );

    let after = read_file(&dest);
    assert!(after.contains("return self.side ** 2"));
    // The module-level decoy and Circle's method keep their bodies.
    assert!(after.contains("return 0"));
    assert!(after.contains("return 3"));
    assert!(!after.contains("return self.side * 2"));
}

#[test]
fn several_definitions_graft_in_one_run() {
    let temp = TempDir::new().unwrap();
    let dest = write_file(
        temp.path(),
        "calc.py",
        indoc! {r#"
            def add(a, b):
                return a
            def sub(a, b):
                return a
            def mul(a, b):
                return a
        "#},
    );
    let src = write_file(
        temp.path(),
        "fix.py",
        indoc! {r#"
            def mul(a, b):
                return a * b
            def add(a, b):
                return a + b
        "#},
    );

    let report = graft(&src, &dest, true).unwrap();

    // Replacements are reported in destination order, not source order.
    let names: Vec<&str> = report.replaced.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["add", "mul"]);
    assert_eq!(
        read_file(&dest),
        indoc! {r#"
            def add(a, b):
                return a + b
            def sub(a, b):
                return a
            def mul(a, b):
                return a * b
        "#}
    );
}

#[test]
fn decorators_travel_with_the_definition() {
    let temp = TempDir::new().unwrap();
    let dest = write_file(
        temp.path(),
        "app.py",
        indoc! {r#"
            @deprecated
            def fetch(url):
                return get(url)
        "#},
    );
    let src = write_file(
        temp.path(),
        "fix.py",
        indoc! {r#"
            @cached
            @retry(times=3)
            def fetch(url):
                return session.get(url)
        "#},
    );

    graft(&src, &dest, true).unwrap();

    let after = read_file(&dest);
    assert!(after.contains("@cached"));
    assert!(after.contains("@retry(times=3)"));
    assert!(!after.contains("@deprecated"));
}

// ============================================================================
// Aborted Runs Leave the Destination Untouched
// ============================================================================

#[test]
fn unresolved_candidate_aborts_before_any_mutation() {
    let temp = TempDir::new().unwrap();
    let dest_text = indoc! {r#"
        def greet(name):
            print("Hello, " + name)
    "#};
    let dest = write_file(temp.path(), "app.py", dest_text);
    let src = write_file(
        temp.path(),
        "scratch.py",
        indoc! {r#"
            def greet(name):
                print(f"Hello, {name}!")


            def absent(x, y):
                return x + y
        "#},
    );

    let err = graft(&src, &dest, false).unwrap_err();

    match &err {
        GraftError::UnresolvedMatches { renders, .. } => {
            assert_eq!(renders.len(), 1);
            assert!(renders[0].contains("def absent(x, y):"));
        }
        other => panic!("expected UnresolvedMatches, got {other:?}"),
    }
    assert_eq!(err.error_code(), OutputErrorCode::ResolutionError);

    // Nothing was staged, published, or backed up.
    assert_eq!(read_file(&dest), dest_text);
    assert_eq!(file_names(temp.path()), ["app.py", "scratch.py"]);
}

#[test]
fn signature_mismatch_counts_as_unresolved() {
    let temp = TempDir::new().unwrap();
    let dest_text = indoc! {r#"
        def greet(name, punctuation="!"):
            print("Hello, " + name + punctuation)
    "#};
    let dest = write_file(temp.path(), "app.py", dest_text);
    let src = write_file(
        temp.path(),
        "scratch.py",
        indoc! {r#"
            def greet(name):
                print(f"Hello, {name}!")
        "#},
    );

    let err = graft(&src, &dest, false).unwrap_err();

    assert!(matches!(err, GraftError::UnresolvedMatches { .. }));
    assert_eq!(read_file(&dest), dest_text);
}

#[test]
fn source_parse_error_aborts_the_run() {
    let temp = TempDir::new().unwrap();
    let dest_text = indoc! {r#"
        def greet(name):
            print("Hello, " + name)
    "#};
    let dest = write_file(temp.path(), "app.py", dest_text);
    let src = write_file(temp.path(), "scratch.py", "def greet(:\n");

    let err = graft(&src, &dest, false).unwrap_err();

    assert!(matches!(err, GraftError::Parse { .. }));
    assert_eq!(err.error_code(), OutputErrorCode::ResolutionError);
    assert_eq!(read_file(&dest), dest_text);
}

#[test]
fn source_without_definitions_is_rejected() {
    let temp = TempDir::new().unwrap();
    let dest_text = indoc! {r#"
        def greet(name):
            print("Hello, " + name)
    "#};
    let dest = write_file(temp.path(), "app.py", dest_text);
    let src = write_file(temp.path(), "scratch.py", "x = 1\nprint(x)\n");

    let err = graft(&src, &dest, false).unwrap_err();

    assert!(matches!(err, GraftError::NoDefinitions { .. }));
    assert_eq!(read_file(&dest), dest_text);
}

#[test]
fn missing_inputs_are_rejected_source_first() {
    let temp = TempDir::new().unwrap();
    let dest = write_file(temp.path(), "app.py", "def f():\n    pass\n");

    let err = graft(&temp.path().join("nope.py"), &dest, false).unwrap_err();
    assert!(matches!(err, GraftError::SourceMissing { .. }));
    assert_eq!(err.error_code(), OutputErrorCode::InvalidArguments);

    let src = write_file(temp.path(), "scratch.py", "def f():\n    pass\n");
    let err = graft(&src, &temp.path().join("gone.py"), false).unwrap_err();
    assert!(matches!(err, GraftError::DestinationMissing { .. }));
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn duplicate_source_candidates_apply_first_in_order() {
    let temp = TempDir::new().unwrap();
    let dest = write_file(
        temp.path(),
        "app.py",
        indoc! {r#"
            def greet(name):
                print("old")
        "#},
    );
    let src = write_file(
        temp.path(),
        "scratch.py",
        indoc! {r#"
            def greet(name):
                print("first")


            def greet(name):
                print("second")
        "#},
    );

    for _ in 0..3 {
        graft(&src, &dest, true).unwrap();
        assert!(read_file(&dest).contains(r#"print("first")"#));
        assert!(!read_file(&dest).contains(r#"print("second")"#));
    }
}

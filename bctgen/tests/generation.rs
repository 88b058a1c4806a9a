//! End-to-end generation run tests with scripted generators.
//!
//! These tests drive `run_generation` against real temp-directory datasets to
//! verify template parsing, per-code table contents, append-across-runs
//! semantics, and failure isolation.

use std::fs;

use bctgen::core::template::{TemplateShape, parse_template};
use bctgen::core::types::CodeStatus;
use bctgen::orchestrate::{RunOptions, run_generation};
use bctgen::test_support::{ScriptedCall, ScriptedGenerator, entry, messages};

fn options(dataset: &str, count: u32) -> RunOptions {
    RunOptions {
        dataset: dataset.to_string(),
        count,
        resume: false,
    }
}

/// Spec example: a separated template and count=3 for code `1.1` yields
/// `1.1.csv` with exactly 3 rows, each labeled `1.1`.
#[test]
fn separated_template_run_writes_three_labeled_rows() {
    let temp = tempfile::tempdir().expect("tempdir");
    let template =
        parse_template("Be concise.\n=====\nWrite a message about self-monitoring.").expect("parse");
    assert_eq!(template.shape, TemplateShape::Separated);
    assert_eq!(template.spec.system, "Be concise.");
    assert_eq!(template.spec.user, "Write a message about self-monitoring.");

    let generator = ScriptedGenerator::new(vec![ScriptedCall::Messages(messages(&[
        "Log your meals daily.",
        "Check your step count tonight.",
        "Note how you feel after exercise.",
    ]))]);

    let report = run_generation(
        temp.path(),
        &generator,
        &template,
        &[entry("1.1")],
        &options("baseline", 3),
    )
    .expect("run");

    assert_eq!(report.rows_written(), 3);
    let contents = fs::read_to_string(temp.path().join("baseline/1.1.csv")).expect("read");
    let rows: Vec<&str> = contents.lines().collect();
    assert_eq!(rows.len(), 3);
    for row in rows {
        assert!(row.ends_with(",1.1"), "row should be labeled 1.1: {row}");
    }
}

/// Spec example: a two-line template parses to the trimmed pair.
#[test]
fn two_line_template_parses_to_pair() {
    let template = parse_template("Sys.\nUser.").expect("parse");
    assert_eq!(template.shape, TemplateShape::TwoLine);
    assert_eq!(template.spec.system, "Sys.");
    assert_eq!(template.spec.user, "User.");
}

/// Idempotent-append: two full runs with the same configuration produce a
/// table whose row count is the sum of both runs' successful generations.
#[test]
fn two_runs_append_sum_of_rows() {
    let temp = tempfile::tempdir().expect("tempdir");
    let template = parse_template("Sys.\nUser.").expect("parse");
    let taxonomy = [entry("2.2")];

    for _ in 0..2 {
        let generator = ScriptedGenerator::new(vec![ScriptedCall::Messages(messages(&[
            "first", "second", "third",
        ]))]);
        let report = run_generation(
            temp.path(),
            &generator,
            &template,
            &taxonomy,
            &options("baseline", 3),
        )
        .expect("run");
        assert_eq!(report.rows_written(), 3);
    }

    let contents = fs::read_to_string(temp.path().join("baseline/2.2.csv")).expect("read");
    assert_eq!(contents.lines().count(), 6);
}

/// Failure isolation: one code failing both attempts leaves the other two
/// codes with their expected row counts on disk.
#[test]
fn one_failing_code_does_not_affect_the_other_two() {
    let temp = tempfile::tempdir().expect("tempdir");
    let template = parse_template("Sys.\nUser.").expect("parse");
    let taxonomy = [entry("1.1"), entry("1.2"), entry("1.3")];

    let generator = ScriptedGenerator::new(vec![
        ScriptedCall::Messages(messages(&["a1", "a2"])),
        ScriptedCall::Fail("503".to_string()),
        ScriptedCall::Fail("503".to_string()),
        ScriptedCall::Messages(messages(&["c1", "c2"])),
    ]);

    let report = run_generation(
        temp.path(),
        &generator,
        &template,
        &taxonomy,
        &options("baseline", 2),
    )
    .expect("run");

    assert_eq!(report.failed_codes(), vec!["1.2"]);
    let read_rows = |code: &str| {
        fs::read_to_string(temp.path().join(format!("baseline/{code}.csv")))
            .map(|contents| contents.lines().count())
            .unwrap_or(0)
    };
    assert_eq!(read_rows("1.1"), 2);
    assert_eq!(read_rows("1.2"), 0);
    assert_eq!(read_rows("1.3"), 2);
}

/// An interrupted run resumed with `--resume` regenerates only the codes that
/// were not recorded complete, and appends nothing for the completed ones.
#[test]
fn resume_finishes_only_pending_codes() {
    let temp = tempfile::tempdir().expect("tempdir");
    let template = parse_template("Sys.\nUser.").expect("parse");
    let taxonomy = [entry("1.1"), entry("1.2")];

    // First run: 1.1 succeeds, 1.2 fails both attempts (stays pending).
    let generator = ScriptedGenerator::new(vec![
        ScriptedCall::Messages(messages(&["a1"])),
        ScriptedCall::Fail("down".to_string()),
        ScriptedCall::Fail("down".to_string()),
    ]);
    run_generation(
        temp.path(),
        &generator,
        &template,
        &taxonomy,
        &options("baseline", 1),
    )
    .expect("first run");

    // Resumed run: only 1.2 should hit the generator.
    let generator = ScriptedGenerator::new(vec![ScriptedCall::Messages(messages(&["b1"]))]);
    let report = run_generation(
        temp.path(),
        &generator,
        &template,
        &taxonomy,
        &RunOptions {
            dataset: "baseline".to_string(),
            count: 1,
            resume: true,
        },
    )
    .expect("resume");

    assert_eq!(generator.calls(), 1);
    assert_eq!(report.outcomes[0].status, CodeStatus::AlreadyDone);
    assert_eq!(report.outcomes[1].status, CodeStatus::Succeeded { rows: 1 });
    let contents = fs::read_to_string(temp.path().join("baseline/1.1.csv")).expect("read");
    assert_eq!(contents, "a1,1.1\n");
    let contents = fs::read_to_string(temp.path().join("baseline/1.2.csv")).expect("read");
    assert_eq!(contents, "b1,1.2\n");
}

/// Messages containing the delimiter survive the CSV round through quoting.
#[test]
fn messages_with_commas_are_quoted_on_disk() {
    let temp = tempfile::tempdir().expect("tempdir");
    let template = parse_template("Sys.\nUser.").expect("parse");

    let generator = ScriptedGenerator::new(vec![ScriptedCall::Messages(messages(&[
        "Set a goal, write it down, review weekly.",
    ]))]);
    run_generation(
        temp.path(),
        &generator,
        &template,
        &[entry("1.1")],
        &options("baseline", 1),
    )
    .expect("run");

    let contents = fs::read_to_string(temp.path().join("baseline/1.1.csv")).expect("read");
    assert_eq!(
        contents,
        "\"Set a goal, write it down, review weekly.\",1.1\n"
    );
}

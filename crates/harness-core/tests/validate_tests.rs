//! Tests for predicate evaluation and expectation validation

use std::time::Duration;

use harness_core::{Error, Expectation, OperationResult, Predicate, validate};
use harness_git::{CommitEntry, RepositorySnapshot};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn snapshot(count: usize, head: &str, tags: &[&str]) -> RepositorySnapshot {
    RepositorySnapshot {
        branch: Some("main".to_string()),
        head: Some(head.to_string()),
        commit_count: count,
        commits: (0..count)
            .map(|i| CommitEntry {
                id: format!("{head}{i:03}"),
                subject: format!("commit {i}"),
            })
            .collect(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        clean: true,
        patch_ids: Vec::new(),
    }
}

fn op(exit_code: i32) -> OperationResult {
    OperationResult {
        exit_code,
        stdout: String::new(),
        stderr: String::new(),
        duration: Duration::from_millis(10),
    }
}

#[test]
fn conjunction_reports_every_predicate_without_short_circuit() {
    let before = snapshot(5, "aaa", &[]);
    let after = snapshot(8, "aaa", &[]); // count moved, HEAD did not

    let expectation = Expectation::new()
        .with(Predicate::HeadChanged) // fails
        .with(Predicate::CommitCountDelta { delta: 3 }); // passes

    let result = validate(&before, &after, &op(0), &expectation);

    assert!(!result.passed, "one failing predicate fails the scenario");
    assert_eq!(result.outcomes.len(), 2, "both predicates must be reported");
    assert!(!result.outcomes[0].passed);
    assert!(result.outcomes[1].passed);
}

#[test]
fn outcomes_carry_expected_and_actual_detail() {
    let before = snapshot(5, "aaa", &[]);
    let after = snapshot(5, "aaa", &[]);

    let expectation = Expectation::new().with(Predicate::CommitCountDelta { delta: 2 });
    let result = validate(&before, &after, &op(0), &expectation);

    let outcome = &result.outcomes[0];
    assert!(!outcome.passed);
    assert!(outcome.expected.contains('7'), "expected: {}", outcome.expected);
    assert!(outcome.actual.contains('5'), "actual: {}", outcome.actual);
}

#[rstest]
#[case(Predicate::HeadChanged, "aaa", "bbb", true)]
#[case(Predicate::HeadChanged, "aaa", "aaa", false)]
#[case(Predicate::HeadUnchanged, "aaa", "aaa", true)]
#[case(Predicate::HeadUnchanged, "aaa", "bbb", false)]
fn head_predicates(
    #[case] predicate: Predicate,
    #[case] before_head: &str,
    #[case] after_head: &str,
    #[case] expected: bool,
) {
    let before = snapshot(3, before_head, &[]);
    let after = snapshot(3, after_head, &[]);

    let result = validate(&before, &after, &op(0), &Expectation::new().with(predicate));
    assert_eq!(result.passed, expected);
}

#[rstest]
#[case(3, 6, 3, true)]
#[case(3, 5, 3, false)]
#[case(6, 1, -5, true)]
fn commit_count_delta_is_exact(
    #[case] before_count: usize,
    #[case] after_count: usize,
    #[case] delta: i64,
    #[case] expected: bool,
) {
    let before = snapshot(before_count, "aaa", &[]);
    let after = snapshot(after_count, "bbb", &[]);

    let expectation = Expectation::new().with(Predicate::CommitCountDelta { delta });
    assert_eq!(validate(&before, &after, &op(0), &expectation).passed, expected);
}

#[rstest]
#[case(3, 6, 2, true)]
#[case(3, 4, 2, false)]
fn commit_count_min_delta_is_a_lower_bound(
    #[case] before_count: usize,
    #[case] after_count: usize,
    #[case] min: i64,
    #[case] expected: bool,
) {
    let before = snapshot(before_count, "aaa", &[]);
    let after = snapshot(after_count, "bbb", &[]);

    let expectation = Expectation::new().with(Predicate::CommitCountMinDelta { min });
    assert_eq!(validate(&before, &after, &op(0), &expectation).passed, expected);
}

#[test]
fn no_tags_removed_detects_a_dropped_tag() {
    let before = snapshot(3, "aaa", &["v1.0", "squash-1"]);
    let kept = snapshot(3, "aaa", &["v1.0", "squash-1", "v2.0"]);
    let dropped = snapshot(3, "aaa", &["v1.0"]);

    let expectation = Expectation::new().with(Predicate::NoTagsRemoved);
    assert!(validate(&before, &kept, &op(0), &expectation).passed);

    let result = validate(&before, &dropped, &op(0), &expectation);
    assert!(!result.passed);
    assert!(result.outcomes[0].actual.contains("squash-1"));
}

#[test]
fn tag_added_requires_a_new_match() {
    let expectation = Expectation::new().with(Predicate::TagAdded {
        pattern: "^squash-".to_string(),
    });

    let before = snapshot(3, "aaa", &[]);
    let after = snapshot(3, "bbb", &["squash-20240101"]);
    assert!(validate(&before, &after, &op(0), &expectation).passed);

    // A pre-existing match does not count as added.
    let before = snapshot(3, "aaa", &["squash-old"]);
    let after = snapshot(3, "bbb", &["squash-old"]);
    assert!(!validate(&before, &after, &op(0), &expectation).passed);
}

#[test]
fn patches_preserved_checks_membership_of_the_newest_ids() {
    let mut before = snapshot(5, "aaa", &[]);
    before.patch_ids = vec!["p1".into(), "p2".into(), "p3".into()];

    let mut preserved = snapshot(8, "bbb", &[]);
    preserved.patch_ids = vec!["x1".into(), "p1".into(), "p2".into(), "p3".into()];

    let mut lost = snapshot(8, "ccc", &[]);
    lost.patch_ids = vec!["p1".into(), "p3".into()];

    let expectation = Expectation::new().with(Predicate::PatchesPreserved { count: 2 });
    assert!(validate(&before, &preserved, &op(0), &expectation).passed);

    let result = validate(&before, &lost, &op(0), &expectation);
    assert!(!result.passed, "p2 disappeared");
    assert!(result.outcomes[0].actual.contains("1 of 2"));
}

#[test]
fn exit_code_predicates_judge_the_operation_result() {
    let before = snapshot(3, "aaa", &[]);
    let after = snapshot(3, "aaa", &[]);

    let exact = Expectation::new().with(Predicate::ExitCode { code: 0 });
    assert!(validate(&before, &after, &op(0), &exact).passed);
    assert!(!validate(&before, &after, &op(1), &exact).passed);

    // Conflict scenarios declare a non-zero exit as their success.
    let nonzero = Expectation::new().with(Predicate::ExitNonzero);
    assert!(validate(&before, &after, &op(128), &nonzero).passed);
    assert!(!validate(&before, &after, &op(0), &nonzero).passed);
}

#[test]
fn snapshot_unchanged_is_a_strict_no_op_check() {
    let before = snapshot(5, "aaa", &["v1.0"]);
    let same = snapshot(5, "aaa", &["v1.0"]);
    let moved = snapshot(5, "bbb", &["v1.0"]);
    let tagged = snapshot(5, "aaa", &["v1.0", "squash-1"]);

    let expectation = Expectation::new().with(Predicate::SnapshotUnchanged);
    assert!(validate(&before, &same, &op(0), &expectation).passed);
    assert!(!validate(&before, &moved, &op(0), &expectation).passed);
    assert!(!validate(&before, &tagged, &op(0), &expectation).passed);
}

#[test]
fn empty_expectation_passes_vacuously() {
    let before = snapshot(3, "aaa", &[]);
    let after = snapshot(9, "bbb", &[]);

    let result = validate(&before, &after, &op(0), &Expectation::new());
    assert!(result.passed);
    assert!(result.outcomes.is_empty());
}

#[test]
fn unknown_predicate_names_fail_closed() {
    let params: toml::Value = toml::from_str("predicate = \"head-chnaged\"").unwrap();
    let err = Predicate::parse("head-chnaged", &params).unwrap_err();

    match err {
        Error::UnknownPredicate { name } => assert_eq!(name, "head-chnaged"),
        other => panic!("expected UnknownPredicate, got: {other}"),
    }
}

#[rstest]
#[case("head-changed", "", Predicate::HeadChanged)]
#[case("commit-count-delta", "delta = 3", Predicate::CommitCountDelta { delta: 3 })]
#[case("tag-added", "pattern = \"^squash-\"", Predicate::TagAdded { pattern: "^squash-".to_string() })]
#[case("patches-preserved", "count = 2", Predicate::PatchesPreserved { count: 2 })]
#[case("exit-code", "code = 1", Predicate::ExitCode { code: 1 })]
fn known_predicates_parse_with_their_parameters(
    #[case] name: &str,
    #[case] params: &str,
    #[case] expected: Predicate,
) {
    let value: toml::Value = toml::from_str(params).unwrap();
    assert_eq!(Predicate::parse(name, &value).unwrap(), expected);
}

#[test]
fn parameterized_predicates_reject_missing_parameters() {
    let empty: toml::Value = toml::from_str("").unwrap();
    assert!(matches!(
        Predicate::parse("commit-count-delta", &empty),
        Err(Error::Scenario { .. })
    ));
}

//! Property-based testing for verify-import
//!
//! Uses proptest to check the marks parsers and the listing diff across
//! randomly generated inputs.

use ::verify_import::diff::{diff_lines, LineChange};
use ::verify_import::*;
use proptest::prelude::*;
use std::io::Cursor;
use std::path::Path;

/// One generated revision: name and its (ref, branch, mark) triples
#[derive(Debug, Clone)]
struct GeneratedRevision {
    revision: String,
    commits: Vec<(String, String, String)>,
}

fn commit_strategy() -> impl Strategy<Value = (String, String, String)> {
    (
        "refs/heads/[a-z]{1,8}",
        prop_oneof![
            Just("trunk".to_string()),
            "branches/[a-z]{1,8}",
            "tags/v[0-9]{1,3}",
        ],
        (1..10_000u32).prop_map(|n| format!(":{}", n)),
    )
}

fn revision_strategy() -> impl Strategy<Value = GeneratedRevision> {
    (
        1..100_000u32,
        prop::collection::vec(commit_strategy(), 0..5),
    )
        .prop_map(|(n, commits)| GeneratedRevision {
            revision: format!("r{}", n),
            commits,
        })
}

fn render(revisions: &[GeneratedRevision]) -> String {
    let mut text = format!("{}\n", revisions.len());
    for rev in revisions {
        text.push_str(&format!("{} {}\n", rev.revision, rev.commits.len()));
        for (reference, branch, mark) in &rev.commits {
            text.push_str(&format!("{} {} {}\n", reference, branch, mark));
        }
    }
    text
}

/// Listing lines in `git ls-tree -r -t` format
fn listing_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        (
            prop_oneof![Just("100644 blob"), Just("100755 blob"), Just("040000 tree")],
            "[0-9a-f]{40}",
            "[a-z]{1,6}(/[a-z]{1,6}){0,2}",
        )
            .prop_map(|(kind, sha, path)| format!("{} {}\t{}", kind, sha, path)),
        0..40,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Parsed revisions and commits match what was written, in order
    #[test]
    fn revision_marks_preserve_structure(
        revisions in prop::collection::vec(revision_strategy(), 0..20)
    ) {
        let mapping = RevisionMapping::from_reader(
            Cursor::new(render(&revisions)),
            Path::new("rev-marks"),
        ).unwrap();

        prop_assert_eq!(mapping.len(), revisions.len());
        prop_assert_eq!(
            mapping.commit_count(),
            revisions.iter().map(|r| r.commits.len()).sum::<usize>()
        );

        for (entry, expected) in mapping.iter().zip(&revisions) {
            prop_assert_eq!(&entry.revision, &expected.revision);
            let triples: Vec<(String, String, String)> = entry
                .commits
                .iter()
                .map(|c| (c.reference.clone(), c.branch_path.clone(), c.mark.clone()))
                .collect();
            prop_assert_eq!(&triples, &expected.commits);
        }
    }

    /// Declaring one more revision than the file holds is a format error
    #[test]
    fn revision_marks_reject_short_files(
        revisions in prop::collection::vec(revision_strategy(), 0..10)
    ) {
        let mut text = render(&revisions);
        let body = text.split_once('\n').map(|(_, rest)| rest.to_string()).unwrap_or_default();
        text = format!("{}\n{}", revisions.len() + 1, body);

        let err = RevisionMapping::from_reader(Cursor::new(text), Path::new("rev-marks"))
            .unwrap_err();
        let is_format = matches!(err, VerifyError::Format { .. });
        prop_assert!(is_format, "expected a format error, got {:?}", err);
    }

    /// The last line for a mark decides its commit
    #[test]
    fn mark_table_last_duplicate_wins(
        entries in prop::collection::vec((1..50u32, "[0-9a-f]{40}"), 1..60)
    ) {
        let text: String = entries
            .iter()
            .map(|(mark, sha)| format!(":{} {}\n", mark, sha))
            .collect();
        let table = MarkTable::from_reader(Cursor::new(text), Path::new("marks")).unwrap();

        for (mark, _) in &entries {
            let expected = entries
                .iter()
                .rev()
                .find(|(m, _)| m == mark)
                .map(|(_, sha)| sha.as_str());
            let key = format!(":{}", mark);
            prop_assert_eq!(table.get(&key), expected);
        }
    }

    /// Identical listings never produce a discrepancy
    #[test]
    fn identical_listings_match(lines in listing_strategy()) {
        let listing = lines.join("\n");
        let found = ListingDiff
            .compare(
                &TreeView::Listing(listing.clone()),
                &TreeView::Listing(listing),
                &IgnoreSet::new(),
            )
            .unwrap();
        prop_assert!(found.is_empty());
    }

    /// Lines only the target has are reported, and nothing else
    #[test]
    fn appended_lines_are_one_sided(
        lines in listing_strategy(),
        extra in prop::collection::vec("extra [a-z]{1,8}", 1..5)
    ) {
        let source = lines.join("\n");
        let mut target_lines = lines.clone();
        target_lines.extend(extra.iter().cloned());
        let target = target_lines.join("\n");

        prop_assert_eq!(ListingDiff::one_sided_lines(&source, &target), extra);
    }

    /// Equal and deleted lines rebuild the old side, equal and inserted the new
    #[test]
    fn diff_reconstructs_both_sides(
        old in prop::collection::vec("[a-d]", 0..30),
        new in prop::collection::vec("[a-d]", 0..30)
    ) {
        let old: Vec<&str> = old.iter().map(String::as_str).collect();
        let new: Vec<&str> = new.iter().map(String::as_str).collect();
        let changes = diff_lines(&old, &new);

        let rebuilt_old: Vec<&str> = changes
            .iter()
            .filter(|c| !matches!(c, LineChange::Insert(_)))
            .map(|c| c.line())
            .collect();
        let rebuilt_new: Vec<&str> = changes
            .iter()
            .filter(|c| !matches!(c, LineChange::Delete(_)))
            .map(|c| c.line())
            .collect();

        prop_assert_eq!(rebuilt_old, old);
        prop_assert_eq!(rebuilt_new, new);
    }
}

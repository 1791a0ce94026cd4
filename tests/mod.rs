//! Main test module for verify-import
//!
//! This module includes all test suites:
//! - Integration tests driving whole runs through the public API
//! - Property-based tests for the parsers and the listing diff

pub mod integration;
pub mod property;

#[cfg(test)]
mod edge_cases {
    use ::verify_import::*;
    use std::io::Cursor;
    use std::path::Path;

    #[test]
    fn test_empty_revision_marks() {
        let mapping = RevisionMapping::from_reader(Cursor::new("0\n"), Path::new("rev-marks")).unwrap();
        assert!(mapping.is_empty());

        let marks = MarkTable::from_reader(Cursor::new(""), Path::new("marks")).unwrap();
        let mut results: Vec<ComparisonResult> = Vec::new();
        let summary = Verifier::new(NoSvn, NoGit, ListingDiff)
            .run(&mapping, &marks, &mut results)
            .unwrap();

        assert_eq!(summary, RunSummary::default());
        assert!(summary.all_ok());
        assert!(results.is_empty());
    }

    #[test]
    fn test_revision_with_no_commits_emits_nothing() {
        let mapping =
            RevisionMapping::from_reader(Cursor::new("2\nr1 0\nr2 0\n"), Path::new("rev-marks")).unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.commit_count(), 0);

        let marks = MarkTable::from_reader(Cursor::new(":1 abc\n"), Path::new("marks")).unwrap();
        let mut results: Vec<ComparisonResult> = Vec::new();
        Verifier::new(NoSvn, NoGit, ListingDiff)
            .run(&mapping, &marks, &mut results)
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_truncated_revision_marks() {
        let err = RevisionMapping::from_reader(
            Cursor::new("2\nr1 1\nrefs/heads/trunk trunk :1\n"),
            Path::new("rev-marks"),
        )
        .unwrap_err();
        assert!(err.is_fatal_input());
        assert!(err.to_string().starts_with("rev-marks:"));
    }

    #[test]
    fn test_listing_whitespace_only_difference() {
        let source = "100644 blob abc\ta.txt\n";
        let target = "100644 blob abc\ta.txt  \n";
        let lines = ListingDiff::one_sided_lines(source, target);
        // The lines differ, but both sides trim to the same text
        assert_eq!(lines, vec!["100644 blob abc\ta.txt", "100644 blob abc\ta.txt"]);
    }

    #[test]
    fn test_ignore_set_normalization() {
        let ignored: IgnoreSet = ["./vendor/", "", "docs/big"].into_iter().collect();
        assert_eq!(ignored.len(), 2);
        assert!(ignored.contains(Path::new("vendor")));
        assert!(ignored.contains(Path::new("docs/big")));
        assert!(!ignored.contains(Path::new("docs")));
    }

    struct NoSvn;

    impl SourceProvider for NoSvn {
        fn list_tree(&self, revision: &str, _branch: &str, _ignored: &IgnoreSet) -> Result<String> {
            panic!("unexpected listing of {}", revision)
        }

        fn checkout(&mut self, revision: &str) -> Result<std::path::PathBuf> {
            panic!("unexpected checkout of {}", revision)
        }
    }

    struct NoGit;

    impl TargetProvider for NoGit {
        fn list_tree(&self, commit: &str) -> Result<String> {
            panic!("unexpected listing of {}", commit)
        }

        fn checkout(&mut self, commit: &str) -> Result<std::path::PathBuf> {
            panic!("unexpected checkout of {}", commit)
        }
    }
}

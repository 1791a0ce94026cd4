//! Integration tests for whole verification runs
//!
//! Providers are replaced by in-memory listings or pre-built directories, so
//! these run without Subversion. Tests that need a real `git` skip themselves
//! when it is not installed.

use ::verify_import::*;
use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing_test::traced_test;

/// Subversion side serving fixed listings and branch directories
#[derive(Default)]
struct MemorySvn {
    listings: HashMap<(String, String), String>,
    root: Option<PathBuf>,
    checkouts: Vec<String>,
}

impl SourceProvider for MemorySvn {
    fn list_tree(&self, revision: &str, branch_path: &str, _ignored: &IgnoreSet) -> Result<String> {
        Ok(self
            .listings
            .get(&(revision.to_string(), branch_path.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn checkout(&mut self, revision: &str) -> Result<PathBuf> {
        self.checkouts.push(revision.to_string());
        self.root
            .clone()
            .ok_or_else(|| VerifyError::InvalidConfiguration("no checkout".to_string()))
    }
}

/// Git side serving fixed listings and one directory per commit
#[derive(Default)]
struct MemoryGit {
    listings: HashMap<String, String>,
    trees: HashMap<String, PathBuf>,
}

impl TargetProvider for MemoryGit {
    fn list_tree(&self, commit: &str) -> Result<String> {
        Ok(self.listings.get(commit).cloned().unwrap_or_default())
    }

    fn checkout(&mut self, commit: &str) -> Result<PathBuf> {
        self.trees
            .get(commit)
            .cloned()
            .ok_or_else(|| VerifyError::InvalidConfiguration(format!("no tree for {}", commit)))
    }
}

fn mapping(text: &str) -> RevisionMapping {
    RevisionMapping::from_reader(Cursor::new(text), Path::new("rev-marks")).unwrap()
}

fn marks(text: &str) -> MarkTable {
    MarkTable::from_reader(Cursor::new(text), Path::new("marks")).unwrap()
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

const LISTING: &str = "\
040000 tree 1111111111111111111111111111111111111111\tsrc
100644 blob 2222222222222222222222222222222222222222\tsrc/main.c
100755 blob 3333333333333333333333333333333333333333\tbuild.sh
";

#[test]
#[traced_test]
fn test_listing_run_reports_each_pair() {
    let mut svn = MemorySvn::default();
    svn.listings.insert(("r1".into(), "trunk".into()), LISTING.into());
    svn.listings.insert(("r2".into(), "trunk".into()), LISTING.into());

    let mut git = MemoryGit::default();
    git.listings.insert("aaa".into(), LISTING.into());
    git.listings.insert(
        "bbb".into(),
        LISTING.replace("100755 blob 3333", "100644 blob 3333"),
    );

    let mut verifier = Verifier::new(svn, git, ListingDiff);
    let mut report = TapReporter::new(Vec::new(), false);
    let summary = verifier
        .run(
            &mapping("2\nr1 1\nrefs/heads/master trunk :1\nr2 1\nrefs/heads/master trunk :2\n"),
            &marks(":1 aaa\n:2 bbb\n"),
            &mut report,
        )
        .unwrap();

    assert_eq!(summary, RunSummary { total: 2, failed: 1 });
    assert_eq!(summary.passed(), 1);

    let output = String::from_utf8(report.into_inner()).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[0], "ok 1 - compare revision r1 and commit aaa (refs/heads/master)");
    assert_eq!(lines[1], "not ok 2 - compare revision r2 and commit bbb (refs/heads/master)");
    assert_eq!(
        &lines[2..],
        &[
            "# 100755 blob 3333333333333333333333333333333333333333\tbuild.sh",
            "# 100644 blob 3333333333333333333333333333333333333333\tbuild.sh",
        ]
    );
}

#[test]
fn test_checkout_run_shares_source_workdir() {
    let svn_root = TempDir::new().unwrap();
    let git_first = TempDir::new().unwrap();
    let git_second = TempDir::new().unwrap();

    write(svn_root.path(), "trunk/README", "hello\n");
    write(svn_root.path(), "trunk/vendor/lib.c", "int x;\n");
    write(svn_root.path(), "branches/stable/README", "hello\n");
    write(git_first.path(), "README", "hello\n");
    write(git_second.path(), "README", "goodbye\n");

    let svn = MemorySvn {
        root: Some(svn_root.path().to_path_buf()),
        ..Default::default()
    };
    let mut git = MemoryGit::default();
    git.trees.insert("c1".into(), git_first.path().to_path_buf());
    git.trees.insert("c2".into(), git_second.path().to_path_buf());

    let mut verifier = Verifier::new(svn, git, FilesystemComparator::new())
        .with_ignored(["vendor"].into_iter().collect());
    let mut results: Vec<ComparisonResult> = Vec::new();
    let summary = verifier
        .run(
            &mapping(
                "1\nr5 2\nrefs/heads/master trunk :1\nrefs/heads/stable branches/stable :2\n",
            ),
            &marks(":1 c1\n:2 c2\n"),
            &mut results,
        )
        .unwrap();

    assert_eq!(summary, RunSummary { total: 2, failed: 1 });
    assert!(results[0].ok(), "{:?}", results[0].discrepancies);
    assert_eq!(
        results[1].discrepancies,
        vec![Discrepancy::ChecksumMismatch {
            source: svn_root.path().join("branches/stable/README"),
            target: git_second.path().join("README"),
        }]
    );
}

#[test]
fn test_json_report_lines() {
    let mut svn = MemorySvn::default();
    svn.listings.insert(("r3".into(), "trunk".into()), LISTING.into());
    let git = MemoryGit::default();

    let mut verifier = Verifier::new(svn, git, ListingDiff);
    let mut report = JsonReporter::new(Vec::new());
    verifier
        .run(
            &mapping("1\nr3 1\nrefs/heads/master trunk :7\n"),
            &marks(":7 f00\n"),
            &mut report,
        )
        .unwrap();

    let output = String::from_utf8(report.into_inner()).unwrap();
    assert_eq!(output.lines().count(), 1);

    let record: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
    assert_eq!(record["sequence"], 1);
    assert_eq!(record["ok"], false);
    assert_eq!(record["revision"], "r3");
    assert_eq!(record["commit"], "f00");
    assert_eq!(record["ref"], "refs/heads/master");
    assert_eq!(record["discrepancies"].as_array().unwrap().len(), 3);
    assert_eq!(record["discrepancies"][0]["kind"], "listing");
}

#[test]
fn test_config_rejects_unknown_mark_before_touching_repositories() {
    let dir = TempDir::new().unwrap();
    let rev_marks = dir.path().join("rev-marks");
    let marks = dir.path().join("marks");
    fs::write(&rev_marks, "1\nr1 1\nrefs/heads/master trunk :9\n").unwrap();
    fs::write(&marks, ":1 abc\n").unwrap();

    // Neither repository exists
    let config = VerifyConfig::new(
        dir.path().join("no-svn"),
        dir.path().join("no-git"),
        &marks,
        &rev_marks,
    );

    let mut report = TapReporter::new(Vec::new(), false);
    let err = config.run(&mut report).unwrap_err();
    assert!(matches!(err, VerifyError::MarkNotFound { ref mark, .. } if mark == ":9"));
    assert!(report.into_inner().is_empty());
}

#[cfg(unix)]
fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(unix)]
fn git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .args(["-c", "user.name=Verifier", "-c", "user.email=verifier@example.com"])
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    String::from_utf8(out.stdout).unwrap()
}

/// Listing mode against a real Git repository and a scripted svn-ls-tree
#[cfg(unix)]
#[test]
fn test_config_listing_mode_with_git() {
    use std::os::unix::fs::PermissionsExt;

    if !git_available() {
        return;
    }

    let dir = TempDir::new().unwrap();
    let git_path = dir.path().join("repo.git");
    let svn_path = dir.path().join("repo.svn");
    fs::create_dir_all(&git_path).unwrap();
    fs::create_dir_all(&svn_path).unwrap();

    git(&git_path, &["init", "--quiet"]);
    write(&git_path, "src/main.c", "int main() { return 0; }\n");
    git(&git_path, &["add", "."]);
    git(&git_path, &["commit", "--quiet", "-m", "r1"]);
    let commit = git(&git_path, &["rev-parse", "HEAD"]).trim().to_string();
    let listing = git(&git_path, &["ls-tree", "-r", "-t", "HEAD"]);

    // Prints the Git listing regardless of arguments
    let listing_file = dir.path().join("listing");
    fs::write(&listing_file, &listing).unwrap();
    let script = dir.path().join("fake-ls-tree");
    fs::write(&script, format!("#!/bin/sh\ncat '{}'\n", listing_file.display())).unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let rev_marks = dir.path().join("rev-marks");
    let marks = dir.path().join("marks");
    fs::write(&rev_marks, "1\nr1 1\nrefs/heads/master trunk :1\n").unwrap();
    fs::write(&marks, format!(":1 {}\n", commit)).unwrap();

    let config = VerifyConfig::new(&svn_path, &git_path, &marks, &rev_marks).svn_ls_tree(&script);
    let mut report = TapReporter::new(Vec::new(), false);
    let summary = config.run(&mut report).unwrap();

    assert!(summary.all_ok());
    assert_eq!(
        String::from_utf8(report.into_inner()).unwrap(),
        format!("ok 1 - compare revision r1 and commit {} (refs/heads/master)\n", commit)
    );
}

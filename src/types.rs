//! Core data types shared across the verifier
//!
//! ## Overview
//!
//! - **Inputs**: [`CommitMark`], [`IgnoreSet`] - what to compare and what to leave out
//! - **Tree state**: [`TreeView`], [`ViewKind`] - one side of a pair as the comparator sees it
//! - **Results**: [`Discrepancy`], [`ComparisonResult`], [`RunSummary`]
//!
//! ## Examples
//!
//! ```rust
//! use verify_import::types::{ComparisonResult, Discrepancy};
//! use std::path::PathBuf;
//!
//! let result = ComparisonResult {
//!     sequence: 1,
//!     revision: "r10".to_string(),
//!     commit: "4b825dc6".to_string(),
//!     reference: "refs/heads/master".to_string(),
//!     discrepancies: vec![Discrepancy::MissingPath {
//!         target: PathBuf::from("/tmp/git/a.txt"),
//!     }],
//! };
//! assert!(!result.ok());
//! assert_eq!(result.discrepancies[0].to_string(), "missing path /tmp/git/a.txt");
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// One Git commit produced from a Subversion revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMark {
    /// Git reference the commit was written to, e.g. `refs/heads/trunk`
    pub reference: String,
    /// Branch path inside the Subversion repository, e.g. `trunk`
    pub branch_path: String,
    /// Fast-import mark, e.g. `:42`
    pub mark: String,
}

/// Relative paths excluded from comparison
///
/// Entries are matched by exact equality against a path relative to the
/// branch root. `./` prefixes and trailing slashes are dropped on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    paths: BTreeSet<String>,
}

impl IgnoreSet {
    /// Create an empty ignore set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a relative path
    pub fn insert(&mut self, path: impl AsRef<str>) -> bool {
        let normalized = normalize(path.as_ref());
        if normalized.is_empty() {
            return false;
        }
        self.paths.insert(normalized)
    }

    /// Check whether a relative path is ignored
    pub fn contains(&self, relative: &Path) -> bool {
        if self.paths.is_empty() {
            return false;
        }
        let joined = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        self.paths.contains(&joined)
    }

    /// Iterate over the ignored paths in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// Number of ignored paths
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether nothing is ignored
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for IgnoreSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = IgnoreSet::new();
        for path in iter {
            set.insert(path);
        }
        set
    }
}

fn normalize(path: &str) -> String {
    let mut path = path.trim();
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path.trim_end_matches('/').to_string()
}

/// Which tree representation a comparator consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// Textual recursive tree listings
    Listing,
    /// Checked-out working directories
    Directory,
}

/// One side of a pair, as handed to a comparator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeView {
    /// Raw output of a recursive tree listing
    Listing(String),
    /// Root of a checked-out tree
    Directory(PathBuf),
}

impl TreeView {
    /// Representation kind of this view
    pub fn kind(&self) -> ViewKind {
        match self {
            TreeView::Listing(_) => ViewKind::Listing,
            TreeView::Directory(_) => ViewKind::Directory,
        }
    }
}

/// A single difference between a revision and its commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discrepancy {
    /// Listing line present on only one side
    Listing { line: String },
    /// Source file has no counterpart in the target tree
    MissingPath { target: PathBuf },
    /// Permission bits differ
    ModeMismatch { source: PathBuf, target: PathBuf },
    /// Content differs
    ChecksumMismatch { source: PathBuf, target: PathBuf },
    /// Symbolic links point at different targets
    SymlinkMismatch { source: PathBuf, target: PathBuf },
    /// Source file is mirrored by a directory, symlink or special file
    TypeMismatch { source: PathBuf, target: PathBuf },
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discrepancy::Listing { line } => f.write_str(line),
            Discrepancy::MissingPath { target } => {
                write!(f, "missing path {}", target.display())
            }
            Discrepancy::ModeMismatch { source, target } => write!(
                f,
                "mode mismatch for {} and {}",
                source.display(),
                target.display()
            ),
            Discrepancy::ChecksumMismatch { source, target } => write!(
                f,
                "checksum mismatch for {} and {}",
                source.display(),
                target.display()
            ),
            Discrepancy::SymlinkMismatch { source, target } => write!(
                f,
                "symlink mismatch for {} and {}",
                source.display(),
                target.display()
            ),
            Discrepancy::TypeMismatch { source, target } => write!(
                f,
                "type mismatch for {} and {}",
                source.display(),
                target.display()
            ),
        }
    }
}

/// Outcome of comparing one revision with one commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonResult {
    /// 1-based position in the run
    pub sequence: usize,
    /// Subversion revision, as written in the revision marks
    pub revision: String,
    /// Git commit id
    pub commit: String,
    /// Git reference the commit belongs to
    pub reference: String,
    /// Differences found, in detection order
    pub discrepancies: Vec<Discrepancy>,
}

impl ComparisonResult {
    /// Whether the trees matched
    pub fn ok(&self) -> bool {
        self.discrepancies.is_empty()
    }

    /// Human-readable description of the pair
    pub fn description(&self) -> String {
        format!(
            "compare revision {} and commit {} ({})",
            self.revision, self.commit, self.reference
        )
    }
}

/// Totals for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Pairs compared
    pub total: usize,
    /// Pairs with at least one discrepancy
    pub failed: usize,
}

impl RunSummary {
    /// Pairs without discrepancies
    pub fn passed(&self) -> usize {
        self.total - self.failed
    }

    /// Whether every pair matched
    pub fn all_ok(&self) -> bool {
        self.failed == 0
    }
}

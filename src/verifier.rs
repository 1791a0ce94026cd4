//! Verification driver
//!
//! The [`Verifier`] walks the revision mapping in file order and, for every
//! commit mark, resolves the Git commit, asks both providers for the tree
//! view its comparator needs, compares them and streams the numbered result
//! to a [`ReportSink`].
//!
//! Pairs are processed strictly one after another: in checkout mode both
//! providers mutate a single working directory each, so two pairs can never
//! be in flight at once.
//!
//! ```rust,no_run
//! use verify_import::{
//!     GitRepo, IgnoreSet, ListingDiff, MarkTable, RevisionMapping, SvnRepo, TapReporter, Verifier,
//! };
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mapping = RevisionMapping::from_path(Path::new("rev-marks"))?;
//! let marks = MarkTable::from_path(Path::new("marks"))?;
//!
//! let mut verifier = Verifier::new(
//!     SvnRepo::open(Path::new("repo.svn"))?,
//!     GitRepo::open(Path::new("repo.git"))?,
//!     ListingDiff,
//! )
//! .with_ignored(IgnoreSet::new());
//!
//! let mut report = TapReporter::new(std::io::stdout(), true);
//! let summary = verifier.run(&mapping, &marks, &mut report)?;
//! println!("{} of {} pairs matched", summary.passed(), summary.total);
//! # Ok(())
//! # }
//! ```

use crate::compare::TreeComparator;
use crate::error::Result;
use crate::marks::{MarkTable, RevisionMapping};
use crate::provider::{SourceProvider, TargetProvider};
use crate::report::ReportSink;
use crate::types::{CommitMark, ComparisonResult, IgnoreSet, RunSummary, TreeView, ViewKind};
use std::time::Instant;
use tracing::{debug, info};

/// Ensure every mark in `mapping` resolves in `marks`
///
/// Run before the first comparison so broken bookkeeping aborts the run
/// without emitting any result.
pub fn check_marks(mapping: &RevisionMapping, marks: &MarkTable) -> Result<()> {
    for entry in mapping {
        for commit in &entry.commits {
            marks.resolve(&commit.mark, &entry.revision)?;
        }
    }
    Ok(())
}

/// Drives a verification run
pub struct Verifier<S, T, C> {
    source: S,
    target: T,
    comparator: C,
    ignored: IgnoreSet,
    next_sequence: usize,
}

impl<S, T, C> Verifier<S, T, C>
where
    S: SourceProvider,
    T: TargetProvider,
    C: TreeComparator,
{
    /// Create a verifier; sequence numbers start at 1
    pub fn new(source: S, target: T, comparator: C) -> Self {
        Self {
            source,
            target,
            comparator,
            ignored: IgnoreSet::new(),
            next_sequence: 1,
        }
    }

    /// Paths to leave out of every comparison
    pub fn with_ignored(mut self, ignored: IgnoreSet) -> Self {
        self.ignored = ignored;
        self
    }

    /// Sequence number the next result will carry
    pub fn next_sequence(&self) -> usize {
        self.next_sequence
    }

    /// Compare every mapped pair and stream the results to `sink`
    pub fn run<R: ReportSink + ?Sized>(
        &mut self,
        mapping: &RevisionMapping,
        marks: &MarkTable,
        sink: &mut R,
    ) -> Result<RunSummary> {
        check_marks(mapping, marks)?;

        let start = Instant::now();
        let mut summary = RunSummary::default();
        info!(
            "Verifying {} commits from {} revisions",
            mapping.commit_count(),
            mapping.len()
        );

        for entry in mapping {
            if entry.commits.is_empty() {
                debug!("Skipping {}: no commits", entry.revision);
                continue;
            }

            for mark in &entry.commits {
                let commit = marks.resolve(&mark.mark, &entry.revision)?;
                let result = self.verify_pair(&entry.revision, mark, commit)?;

                summary.total += 1;
                if !result.ok() {
                    summary.failed += 1;
                }
                sink.report(&result)?;
            }
        }

        info!(
            "Verified {} pairs ({} failed) in {}",
            summary.total,
            summary.failed,
            humantime::format_duration(std::time::Duration::from_millis(
                start.elapsed().as_millis() as u64
            ))
        );
        Ok(summary)
    }

    /// Compare one revision/commit pair and number the result
    pub fn verify_pair(
        &mut self,
        revision: &str,
        mark: &CommitMark,
        commit: &str,
    ) -> Result<ComparisonResult> {
        debug!(
            "Comparing {} ({}) with {} ({})",
            revision, mark.branch_path, commit, mark.reference
        );

        let (source, target) = match self.comparator.view_kind() {
            ViewKind::Listing => (
                TreeView::Listing(self.source.list_tree(revision, &mark.branch_path, &self.ignored)?),
                TreeView::Listing(self.target.list_tree(commit)?),
            ),
            ViewKind::Directory => (
                TreeView::Directory(self.source.checkout(revision)?.join(&mark.branch_path)),
                TreeView::Directory(self.target.checkout(commit)?),
            ),
        };

        let discrepancies = self.comparator.compare(&source, &target, &self.ignored)?;

        let sequence = self.next_sequence;
        self.next_sequence += 1;

        Ok(ComparisonResult {
            sequence,
            revision: revision.to_string(),
            commit: commit.to_string(),
            reference: mark.reference.clone(),
            discrepancies,
        })
    }
}

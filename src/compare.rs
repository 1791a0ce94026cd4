//! Tree comparison strategies
//!
//! A [`TreeComparator`] receives one [`TreeView`] per side plus the ignore
//! set and returns the discrepancies it found, in detection order. The
//! verifier asks [`TreeComparator::view_kind`] which representation to fetch
//! and is otherwise strategy-agnostic.
//!
//! ## Strategies
//!
//! - [`ListingDiff`]: diffs two recursive tree listings line by line. Ignored
//!   paths are excluded by the listing tool itself.
//! - [`FilesystemComparator`]: walks a checked-out source tree and checks each
//!   file against the mirrored path in the checked-out target tree.
//!
//! The filesystem walk is source-directed: a file that exists only in the
//! target tree is never visited and therefore never reported.

use crate::checksum::{Checksum, Sha256Checksum};
use crate::diff::{diff_lines, LineChange};
use crate::error::{Result, VerifyError};
use crate::types::{Discrepancy, IgnoreSet, TreeView, ViewKind};
use crate::utils;
use std::path::Path;
use tracing::{debug, trace, warn};
use walkdir::{DirEntry, WalkDir};

/// Version control metadata directories skipped at the top of a checkout
pub const VCS_METADATA_DIRS: &[&str] = &[".svn", ".git"];

/// Compares the two sides of one revision/commit pair
pub trait TreeComparator {
    /// Representation this comparator consumes
    fn view_kind(&self) -> ViewKind;

    /// Compare `source` against `target`
    ///
    /// Discrepancies are findings, not errors; `Err` means the comparison
    /// itself could not be carried out.
    fn compare(
        &self,
        source: &TreeView,
        target: &TreeView,
        ignored: &IgnoreSet,
    ) -> Result<Vec<Discrepancy>>;
}

impl<C: TreeComparator + ?Sized> TreeComparator for Box<C> {
    fn view_kind(&self) -> ViewKind {
        (**self).view_kind()
    }

    fn compare(
        &self,
        source: &TreeView,
        target: &TreeView,
        ignored: &IgnoreSet,
    ) -> Result<Vec<Discrepancy>> {
        (**self).compare(source, target, ignored)
    }
}

/// Line diff of two tree listings
#[derive(Debug, Clone, Copy, Default)]
pub struct ListingDiff;

impl ListingDiff {
    /// Lines present in only one of the listings, trimmed, in diff order
    pub fn one_sided_lines(source: &str, target: &str) -> Vec<String> {
        let source_lines: Vec<&str> = source.lines().collect();
        let target_lines: Vec<&str> = target.lines().collect();

        diff_lines(&source_lines, &target_lines)
            .into_iter()
            .filter(LineChange::is_change)
            .map(|change| change.line().trim().to_string())
            .collect()
    }
}

impl TreeComparator for ListingDiff {
    fn view_kind(&self) -> ViewKind {
        ViewKind::Listing
    }

    fn compare(
        &self,
        source: &TreeView,
        target: &TreeView,
        _ignored: &IgnoreSet,
    ) -> Result<Vec<Discrepancy>> {
        let (TreeView::Listing(source), TreeView::Listing(target)) = (source, target) else {
            return Err(wrong_view(self.view_kind(), source, target));
        };

        let lines = Self::one_sided_lines(source, target);
        debug!("Listing diff found {} one-sided lines", lines.len());
        Ok(lines
            .into_iter()
            .map(|line| Discrepancy::Listing { line })
            .collect())
    }
}

/// Existence, mode and checksum comparison of two checked-out trees
pub struct FilesystemComparator<C = Sha256Checksum> {
    checksum: C,
}

impl FilesystemComparator<Sha256Checksum> {
    /// Comparator hashing files in-process with SHA-256
    pub fn new() -> Self {
        Self {
            checksum: Sha256Checksum,
        }
    }
}

impl Default for FilesystemComparator<Sha256Checksum> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Checksum> FilesystemComparator<C> {
    /// Comparator using a custom checksum implementation
    pub fn with_checksum(checksum: C) -> Self {
        Self { checksum }
    }

    /// Walk `source_root` and check every file against `target_root`
    pub fn compare_dirs(
        &self,
        source_root: &Path,
        target_root: &Path,
        ignored: &IgnoreSet,
    ) -> Result<Vec<Discrepancy>> {
        let mut discrepancies = Vec::new();
        let mut files = 0usize;

        let walker = WalkDir::new(source_root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_pruned(entry, source_root, ignored));

        for entry in walker {
            let entry = entry.map_err(|e| {
                warn!("Walk error under {}: {}", source_root.display(), e);
                VerifyError::WalkDir(e)
            })?;

            let file_type = entry.file_type();
            if !file_type.is_file() && !file_type.is_symlink() {
                continue;
            }

            let relative = utils::make_relative(entry.path(), source_root)?;
            let source_path = entry.path();
            let target_path = target_root.join(&relative);
            files += 1;

            if !utils::path_exists(&target_path) {
                trace!("Missing {}", target_path.display());
                discrepancies.push(Discrepancy::MissingPath {
                    target: target_path,
                });
                continue;
            }

            if file_type.is_symlink() {
                self.check_symlink(source_path, &target_path, &mut discrepancies)?;
            } else {
                self.check_file(source_path, &target_path, &mut discrepancies)?;
            }
        }

        debug!(
            "Compared {} entries under {}, {} discrepancies",
            files,
            source_root.display(),
            discrepancies.len()
        );
        Ok(discrepancies)
    }

    fn check_file(
        &self,
        source: &Path,
        target: &Path,
        discrepancies: &mut Vec<Discrepancy>,
    ) -> Result<()> {
        // Only regular files are hashed; anything else is a type change
        if !std::fs::symlink_metadata(target)?.file_type().is_file() {
            trace!("{} is not a regular file", target.display());
            discrepancies.push(Discrepancy::TypeMismatch {
                source: source.to_path_buf(),
                target: target.to_path_buf(),
            });
            return Ok(());
        }

        if utils::file_mode(source)? != utils::file_mode(target)? {
            discrepancies.push(Discrepancy::ModeMismatch {
                source: source.to_path_buf(),
                target: target.to_path_buf(),
            });
        }

        if self.checksum.checksum(source)? != self.checksum.checksum(target)? {
            discrepancies.push(Discrepancy::ChecksumMismatch {
                source: source.to_path_buf(),
                target: target.to_path_buf(),
            });
        }

        Ok(())
    }

    fn check_symlink(
        &self,
        source: &Path,
        target: &Path,
        discrepancies: &mut Vec<Discrepancy>,
    ) -> Result<()> {
        let target_is_link = std::fs::symlink_metadata(target)?.file_type().is_symlink();
        if !target_is_link || utils::read_symlink(source)? != utils::read_symlink(target)? {
            discrepancies.push(Discrepancy::SymlinkMismatch {
                source: source.to_path_buf(),
                target: target.to_path_buf(),
            });
        }
        Ok(())
    }
}

impl<C: Checksum> TreeComparator for FilesystemComparator<C> {
    fn view_kind(&self) -> ViewKind {
        ViewKind::Directory
    }

    fn compare(
        &self,
        source: &TreeView,
        target: &TreeView,
        ignored: &IgnoreSet,
    ) -> Result<Vec<Discrepancy>> {
        let (TreeView::Directory(source), TreeView::Directory(target)) = (source, target) else {
            return Err(wrong_view(self.view_kind(), source, target));
        };
        self.compare_dirs(source, target, ignored)
    }
}

/// Whether the walk must not enter (or report) this entry
fn is_pruned(entry: &DirEntry, root: &Path, ignored: &IgnoreSet) -> bool {
    if entry.depth() == 0 {
        return false;
    }

    // Only the checkout's own metadata; deeper `.git`/`.svn` are content
    if entry.depth() == 1
        && entry.file_type().is_dir()
        && VCS_METADATA_DIRS
            .iter()
            .any(|name| entry.file_name() == *name)
    {
        return true;
    }

    match entry.path().strip_prefix(root) {
        Ok(relative) => ignored.contains(relative),
        Err(_) => false,
    }
}

fn wrong_view(expected: ViewKind, source: &TreeView, target: &TreeView) -> VerifyError {
    VerifyError::internal(format!(
        "comparator expects {:?} views, got {:?} and {:?}",
        expected,
        source.kind(),
        target.kind()
    ))
}

//! Run configuration
//!
//! [`VerifyConfig`] collects everything a run needs and wires the parsers,
//! providers and comparator together. The command-line binary is a thin
//! layer over it.
//!
//! ```rust,no_run
//! use verify_import::{ComparisonMode, TapReporter, VerifyConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = VerifyConfig::new("repo.svn", "repo.git", "marks", "rev-marks")
//!     .mode(ComparisonMode::Checkout)
//!     .ignore_path("vendor")
//!     .checksum_command("sha1sum");
//!
//! let summary = config.run(&mut TapReporter::new(std::io::stdout(), false))?;
//! assert!(summary.total >= summary.failed);
//! # Ok(())
//! # }
//! ```

use crate::checksum::{ExternalChecksum, Sha256Checksum};
use crate::compare::{FilesystemComparator, ListingDiff, TreeComparator};
use crate::error::Result;
use crate::marks::{MarkTable, RevisionMapping};
use crate::provider::{GitRepo, SvnRepo};
use crate::report::ReportSink;
use crate::types::{IgnoreSet, RunSummary};
use crate::verifier::{check_marks, Verifier};
use std::ffi::OsString;
use std::path::PathBuf;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Which comparator strategy a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComparisonMode {
    /// Diff `svn-ls-tree` against `git ls-tree` output
    #[default]
    Listing,
    /// Check out both sides and compare files on disk
    Checkout,
}

/// Configuration for one verification run
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Subversion repository directory
    pub svn_path: PathBuf,
    /// Git repository
    pub git_path: PathBuf,
    /// Git marks file (`mark commit`)
    pub marks: PathBuf,
    /// Subversion revision marks file
    pub rev_marks: PathBuf,
    /// Paths excluded from comparison, relative to each branch root
    pub ignored: IgnoreSet,
    /// Comparator strategy
    pub mode: ComparisonMode,
    /// Subversion checkout directory; a temporary one when unset
    pub svn_workdir: Option<PathBuf>,
    /// Git checkout directory; a temporary one when unset
    pub git_workdir: Option<PathBuf>,
    /// Listing tool for the Subversion side
    pub svn_ls_tree: OsString,
    /// External checksum program; SHA-256 in-process when unset
    pub checksum_command: Option<OsString>,
}

impl VerifyConfig {
    /// Configuration with the four required inputs and defaults elsewhere
    pub fn new(
        svn_path: impl Into<PathBuf>,
        git_path: impl Into<PathBuf>,
        marks: impl Into<PathBuf>,
        rev_marks: impl Into<PathBuf>,
    ) -> Self {
        Self {
            svn_path: svn_path.into(),
            git_path: git_path.into(),
            marks: marks.into(),
            rev_marks: rev_marks.into(),
            ignored: IgnoreSet::new(),
            mode: ComparisonMode::default(),
            svn_workdir: None,
            git_workdir: None,
            svn_ls_tree: "svn-ls-tree".into(),
            checksum_command: None,
        }
    }

    /// Set the comparator strategy
    pub fn mode(mut self, mode: ComparisonMode) -> Self {
        self.mode = mode;
        self
    }

    /// Ignore one more relative path
    pub fn ignore_path(mut self, path: impl AsRef<str>) -> Self {
        self.ignored.insert(path);
        self
    }

    /// Ignore several relative paths
    pub fn ignore_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for path in paths {
            self.ignored.insert(path);
        }
        self
    }

    /// Use a fixed Subversion checkout directory
    pub fn svn_workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.svn_workdir = Some(dir.into());
        self
    }

    /// Use a fixed Git checkout directory
    pub fn git_workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.git_workdir = Some(dir.into());
        self
    }

    /// Listing tool for the Subversion side
    pub fn svn_ls_tree(mut self, program: impl Into<OsString>) -> Self {
        self.svn_ls_tree = program.into();
        self
    }

    /// Compute checksums with an external program
    pub fn checksum_command(mut self, program: impl Into<OsString>) -> Self {
        self.checksum_command = Some(program.into());
        self
    }

    /// Parse both marks files
    ///
    /// Fails before any repository is touched if either file is malformed.
    pub fn load_marks(&self) -> Result<(RevisionMapping, MarkTable)> {
        let mapping = RevisionMapping::from_path(&self.rev_marks)?;
        let marks = MarkTable::from_path(&self.marks)?;
        check_marks(&mapping, &marks)?;
        Ok((mapping, marks))
    }

    /// Run the verification and stream results to `sink`
    pub fn run<R: ReportSink + ?Sized>(&self, sink: &mut R) -> Result<RunSummary> {
        if self.mode == ComparisonMode::Listing {
            if let Some(program) = &self.checksum_command {
                warn!(
                    "Checksum command {} is only used in checkout mode, ignoring it",
                    program.to_string_lossy()
                );
            }
        }

        let (mapping, marks) = self.load_marks()?;

        let mut svn = SvnRepo::open(&self.svn_path)?.with_ls_tree(self.svn_ls_tree.clone());
        let mut git = GitRepo::open(&self.git_path)?;

        // Temporary checkouts live until the run returns
        let mut scratch: Vec<TempDir> = Vec::new();

        let comparator: Box<dyn TreeComparator> = match self.mode {
            ComparisonMode::Listing => Box::new(ListingDiff),
            ComparisonMode::Checkout => {
                let svn_dir = match &self.svn_workdir {
                    Some(dir) => dir.clone(),
                    None => scratch_dir(&mut scratch, "verify-import-svn-")?,
                };
                let git_dir = match &self.git_workdir {
                    Some(dir) => dir.clone(),
                    None => scratch_dir(&mut scratch, "verify-import-git-")?,
                };
                info!(
                    "Checkout mode: svn in {}, git in {}",
                    svn_dir.display(),
                    git_dir.display()
                );
                svn = svn.with_workdir(svn_dir);
                git = git.with_workdir(git_dir);

                match &self.checksum_command {
                    Some(program) => Box::new(FilesystemComparator::with_checksum(
                        ExternalChecksum::new(program.clone()),
                    )),
                    None => Box::new(FilesystemComparator::with_checksum(Sha256Checksum)),
                }
            }
        };

        let mut verifier = Verifier::new(svn, git, comparator).with_ignored(self.ignored.clone());
        verifier.run(&mapping, &marks, sink)
    }
}

fn scratch_dir(scratch: &mut Vec<TempDir>, prefix: &str) -> Result<PathBuf> {
    let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
    // Providers clone or check out into a path that must not exist yet
    let path = dir.path().join("tree");
    debug!("Using scratch checkout {}", path.display());
    scratch.push(dir);
    Ok(path)
}

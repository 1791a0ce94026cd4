//! # verify-import - check a Subversion to Git import tree by tree
//!
//! After a history import, every Subversion revision maps to one or more Git
//! commits through the two marks files the import leaves behind. This crate
//! walks that correspondence and, for each (revision, commit) pair, checks
//! that the trees are identical. Each pair produces one TAP-style result
//! line, so a failed pair never hides the status of the others.
//!
//! ## Architecture
//!
//! - **Marks parsing** ([`marks`]): the revision marks file (revision ->
//!   branch, ref, mark) and the Git marks file (mark -> commit)
//! - **Providers** ([`provider`]): `svn-ls-tree`/`git ls-tree` listings, or
//!   checkouts into one working directory per side
//! - **Comparators** ([`compare`]): a line diff of the two listings, or a
//!   walk of the checked-out trees comparing existence, mode and checksum
//! - **Driver** ([`verifier`]): strictly sequential, numbered, streaming
//! - **Reports** ([`report`]): TAP text or JSON lines
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use verify_import::{TapReporter, VerifyConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = VerifyConfig::new("/srv/svn/project", "project.git", "git-marks", "svn-rev-marks")
//!     .ignore_path("vendor");
//!
//! let summary = config.run(&mut TapReporter::new(std::io::stdout(), true))?;
//! if !summary.all_ok() {
//!     eprintln!("{} of {} pairs differ", summary.failed, summary.total);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Malformed marks files, marks that do not resolve and failing external
//! tools abort the run with a [`VerifyError`]. Content differences are not
//! errors: they are [`Discrepancy`] values inside a [`ComparisonResult`].

pub mod checksum;
pub mod command;
pub mod compare;
pub mod config;
pub mod diff;
pub mod error;
pub mod marks;
pub mod provider;
pub mod report;
pub mod types;
pub mod verifier;

mod utils;

pub use checksum::{Checksum, ExternalChecksum, Sha256Checksum};
pub use compare::{FilesystemComparator, ListingDiff, TreeComparator};
pub use config::{ComparisonMode, VerifyConfig};
pub use error::{Result, VerifyError};
pub use marks::{parse_mark_table, parse_revision_marks, MarkTable, RevisionEntry, RevisionMapping};
pub use provider::{GitRepo, SourceProvider, SvnRepo, TargetProvider};
pub use report::{JsonReporter, ReportSink, TapReporter};
pub use types::*;
pub use verifier::{check_marks, Verifier};

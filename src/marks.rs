//! Parsers for the two correspondence files written by an import
//!
//! ## Revision marks
//!
//! Written by the Subversion exporter. The first line holds the number of
//! revisions; each revision is a header line followed by one line per Git
//! commit it produced:
//!
//! ```text
//! 2
//! r1 1
//! refs/heads/trunk trunk :1
//! r2 2
//! refs/heads/trunk trunk :2
//! refs/heads/stable branches/stable :3
//! ```
//!
//! Parsing is strict: every declared count must be matched exactly, and
//! anything after the last declared revision is rejected.
//!
//! ## Git marks
//!
//! Written by `git fast-import --export-marks`: one `mark commit` pair per
//! line. A mark that appears twice keeps the commit of its last occurrence,
//! which is how fast-import itself treats re-used marks.

use crate::error::{Result, VerifyError};
use crate::types::CommitMark;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Commits produced by one Subversion revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionEntry {
    /// Revision token as written in the file, e.g. `r42`
    pub revision: String,
    /// Commits in file order
    pub commits: Vec<CommitMark>,
}

/// Ordered revision to commit-marks mapping
///
/// Iteration order is file order; revisions are never re-sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevisionMapping {
    entries: Vec<RevisionEntry>,
}

impl RevisionMapping {
    /// Parse a revision marks file
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), path)
    }

    /// Parse revision marks from any buffered reader
    ///
    /// `origin` only labels error messages.
    pub fn from_reader<R: BufRead>(reader: R, origin: &Path) -> Result<Self> {
        let mut lines = NumberedLines::new(reader, origin);

        let (line_no, header) = lines.expect_line("missing revision count")?;
        let num_revisions = parse_count(header.trim(), origin, line_no, "revision count")?;

        let mut entries = Vec::with_capacity(num_revisions);
        for _ in 0..num_revisions {
            let (line_no, line) = lines.expect_line("missing revision header")?;
            let [revision, num_commits] = split_fields::<2>(&line, origin, line_no)?;
            let num_commits = parse_count(num_commits, origin, line_no, "commit count")?;

            let mut commits = Vec::with_capacity(num_commits);
            for _ in 0..num_commits {
                let (line_no, line) =
                    lines.expect_line(&format!("missing commit line for revision {}", revision))?;
                let [reference, branch_path, mark] = split_fields::<3>(&line, origin, line_no)?;
                commits.push(CommitMark {
                    reference: reference.to_string(),
                    branch_path: branch_path.to_string(),
                    mark: mark.to_string(),
                });
            }

            entries.push(RevisionEntry {
                revision: revision.to_string(),
                commits,
            });
        }

        while let Some((line_no, line)) = lines.next_line()? {
            if !line.trim().is_empty() {
                return Err(VerifyError::format(
                    origin,
                    line_no,
                    format!("unexpected data after {} declared revisions", num_revisions),
                ));
            }
        }

        let mapping = Self { entries };
        debug!(
            "Parsed {} revisions with {} commits from {}",
            mapping.len(),
            mapping.commit_count(),
            origin.display()
        );
        Ok(mapping)
    }

    /// Iterate over revisions in file order
    pub fn iter(&self) -> std::slice::Iter<'_, RevisionEntry> {
        self.entries.iter()
    }

    /// Number of revisions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping has no revisions
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of commit marks across all revisions
    pub fn commit_count(&self) -> usize {
        self.entries.iter().map(|e| e.commits.len()).sum()
    }
}

impl<'a> IntoIterator for &'a RevisionMapping {
    type Item = &'a RevisionEntry;
    type IntoIter = std::slice::Iter<'a, RevisionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Mark to Git commit lookup table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkTable {
    commits: HashMap<String, String>,
}

impl MarkTable {
    /// Parse a Git marks file
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), path)
    }

    /// Parse Git marks from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R, origin: &Path) -> Result<Self> {
        let mut lines = NumberedLines::new(reader, origin);
        let mut commits = HashMap::new();
        let mut duplicates = 0usize;

        while let Some((line_no, line)) = lines.next_line()? {
            if line.trim().is_empty() {
                continue;
            }
            let [mark, commit] = split_fields::<2>(&line, origin, line_no)?;
            if commits.insert(mark.to_string(), commit.to_string()).is_some() {
                duplicates += 1;
            }
        }

        debug!(
            "Parsed {} marks from {} ({} overwritten)",
            commits.len(),
            origin.display(),
            duplicates
        );
        Ok(Self { commits })
    }

    /// Look up the commit for a mark
    pub fn get(&self, mark: &str) -> Option<&str> {
        self.commits.get(mark).map(String::as_str)
    }

    /// Look up the commit for a mark referenced by `revision`
    pub fn resolve(&self, mark: &str, revision: &str) -> Result<&str> {
        self.get(mark).ok_or_else(|| VerifyError::MarkNotFound {
            mark: mark.to_string(),
            revision: revision.to_string(),
        })
    }

    /// Number of distinct marks
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

/// Parse a Subversion revision marks file
pub fn parse_revision_marks(path: &Path) -> Result<RevisionMapping> {
    RevisionMapping::from_path(path)
}

/// Parse a Git marks file
pub fn parse_mark_table(path: &Path) -> Result<MarkTable> {
    MarkTable::from_path(path)
}

/// Line reader that tracks 1-based line numbers for error messages
struct NumberedLines<'a, R> {
    lines: std::io::Lines<R>,
    origin: &'a Path,
    line_no: usize,
}

impl<'a, R: BufRead> NumberedLines<'a, R> {
    fn new(reader: R, origin: &'a Path) -> Self {
        Self {
            lines: reader.lines(),
            origin,
            line_no: 0,
        }
    }

    fn next_line(&mut self) -> Result<Option<(usize, String)>> {
        match self.lines.next() {
            Some(line) => {
                self.line_no += 1;
                Ok(Some((self.line_no, line?)))
            }
            None => Ok(None),
        }
    }

    fn expect_line(&mut self, missing: &str) -> Result<(usize, String)> {
        match self.next_line()? {
            Some(line) => Ok(line),
            None => Err(VerifyError::format(
                PathBuf::from(self.origin),
                self.line_no + 1,
                format!("{} (unexpected end of file)", missing),
            )),
        }
    }
}

fn split_fields<'l, const N: usize>(line: &'l str, origin: &Path, line_no: usize) -> Result<[&'l str; N]> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    <[&str; N]>::try_from(fields.as_slice()).map_err(|_| {
        VerifyError::format(
            origin,
            line_no,
            format!("expected {} fields, found {}", N, fields.len()),
        )
    })
}

fn parse_count(field: &str, origin: &Path, line_no: usize, what: &str) -> Result<usize> {
    field.parse::<usize>().map_err(|e| {
        VerifyError::format(origin, line_no, format!("invalid {} {:?}: {}", what, field, e))
    })
}

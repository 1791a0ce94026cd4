//! File content checksums
//!
//! The filesystem comparator only needs digests that compare equal for equal
//! content. [`Sha256Checksum`] computes them in-process; [`ExternalChecksum`]
//! delegates to a program such as `sha1sum` or `md5sum` and takes the first
//! whitespace-separated token of its output.

use crate::command;
use crate::error::{Result, VerifyError};
use crate::utils;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

/// Computes a comparable digest for a file
pub trait Checksum {
    /// Digest of the file at `path`
    fn checksum(&self, path: &Path) -> Result<String>;
}

/// In-process SHA-256
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Checksum;

impl Checksum for Sha256Checksum {
    fn checksum(&self, path: &Path) -> Result<String> {
        utils::hash_file_content(path)
    }
}

/// Checksum computed by an external program invoked once per file
#[derive(Debug, Clone)]
pub struct ExternalChecksum {
    program: OsString,
    args: Vec<OsString>,
}

impl ExternalChecksum {
    /// Use `program <path>`
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Insert extra arguments before the file path
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl Checksum for ExternalChecksum {
    fn checksum(&self, path: &Path) -> Result<String> {
        let output = command::run_text(Command::new(&self.program).args(&self.args).arg(path))?;
        output
            .split_whitespace()
            .next()
            .map(str::to_string)
            .ok_or_else(|| {
                VerifyError::internal(format!(
                    "{} printed no checksum for {}",
                    self.program.to_string_lossy(),
                    path.display()
                ))
            })
    }
}

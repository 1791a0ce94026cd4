//! Error types for import verification
//!
//! Everything that aborts a verification run is a [`VerifyError`]. Content
//! divergence between a revision and its commit is *not* an error: it is
//! recorded as a [`Discrepancy`](crate::types::Discrepancy) and reported, and
//! the run carries on with the next pair.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Type alias for Results in this crate
pub type Result<T> = std::result::Result<T, VerifyError>;

/// Main error type for all verification operations
#[derive(Debug, Error)]
pub enum VerifyError {
    /// I/O errors during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors during JSON report serialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Walk directory error from walkdir crate
    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Malformed marks file
    #[error("{}:{line}: {message}", path.display())]
    Format {
        /// File being parsed
        path: PathBuf,
        /// 1-based line number where parsing stopped
        line: usize,
        /// What was wrong with the line
        message: String,
    },

    /// A mark referenced by the revision marks has no commit in the mark table
    #[error("Mark {mark} of revision {revision} not found in the Git marks")]
    MarkNotFound {
        /// Unresolved mark
        mark: String,
        /// Revision that referenced it
        revision: String,
    },

    /// An external command exited unsuccessfully
    #[error("`{command}` failed ({status}):\n{output}")]
    ExternalTool {
        /// Rendered command line
        command: String,
        /// Exit status of the process
        status: ExitStatus,
        /// Captured stdout followed by stderr
        output: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VerifyError {
    /// Create a format error for `path` at 1-based `line`
    pub fn format(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        VerifyError::Format {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Create an internal error with a custom message
    pub fn internal(msg: impl Into<String>) -> Self {
        VerifyError::Internal(msg.into())
    }

    /// Check if this error means the marks data itself is broken
    ///
    /// These errors are raised before the first pair is compared.
    pub fn is_fatal_input(&self) -> bool {
        matches!(
            self,
            VerifyError::Format { .. } | VerifyError::MarkNotFound { .. }
        )
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            VerifyError::MarkNotFound { mark, revision } => {
                format!(
                    "Mark {} (revision {}) has no commit in the Git marks file. \
                     Check that --marks and --rev-marks come from the same import.",
                    mark, revision
                )
            }
            VerifyError::ExternalTool { command, .. } if command.starts_with("svn-ls-tree") => {
                format!("{}\nIs svn-ls-tree installed and on PATH? See --svn-ls-tree.", self)
            }
            _ => self.to_string(),
        }
    }
}

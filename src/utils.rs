//! Filesystem helpers used by the comparators
//!
//! ## Categories of Utilities
//!
//! ### File Operations
//! - File content hashing (SHA-256)
//! - Permission bits (cross-platform)
//! - Symbolic link reading
//!
//! ### Path Manipulation
//! - Converting absolute paths to relative paths
//!
//! All functions return `Result<T, VerifyError>`.

use crate::error::{Result, VerifyError};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Hash a file's content efficiently using SHA-256
///
/// Streams the file through an 8KB buffer and returns the digest as a
/// 64-character hexadecimal string.
///
/// # Errors
///
/// - [`VerifyError::Io`] if the file cannot be opened or read
pub fn hash_file_content(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192]; // 8KB buffer

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Permission bits of a file, without following symlinks
///
/// Only the low twelve bits (`0o7777`) are returned so the file type bits
/// never take part in a comparison.
pub fn file_mode(path: &Path) -> Result<u32> {
    let metadata = fs::symlink_metadata(path)?;
    Ok(get_permissions(&metadata) & 0o7777)
}

/// Get Unix permissions from metadata
#[cfg(unix)]
fn get_permissions(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

/// Get permissions from metadata (Windows implementation)
#[cfg(windows)]
fn get_permissions(metadata: &fs::Metadata) -> u32 {
    // Only the read-only attribute survives a round trip through Windows
    let mut mode = if metadata.permissions().readonly() { 0o444 } else { 0o644 };
    if metadata.is_dir() {
        mode |= 0o111;
    }
    mode
}

/// Read the target of a symbolic link
pub fn read_symlink(path: &Path) -> Result<PathBuf> {
    Ok(fs::read_link(path)?)
}

/// Whether anything (including a dangling symlink) exists at `path`
pub fn path_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Make a path relative to a base path
///
/// Tries a lexical strip first so symbolic links inside the tree keep their
/// own path, then falls back to canonicalizing both sides.
///
/// # Errors
///
/// - [`VerifyError::Internal`] if the path is not under the base path
/// - [`VerifyError::Io`] if canonicalization fails (fallback case only)
pub fn make_relative(path: &Path, base: &Path) -> Result<PathBuf> {
    if let Ok(relative) = path.strip_prefix(base) {
        return Ok(relative.to_path_buf());
    }

    let path_canon = path.canonicalize()?;
    let base_canon = base.canonicalize()?;

    path_canon
        .strip_prefix(&base_canon)
        .map(|p| p.to_path_buf())
        .map_err(|_| {
            VerifyError::internal(format!(
                "Path {:?} is not relative to {:?}",
                path_canon, base_canon
            ))
        })
}

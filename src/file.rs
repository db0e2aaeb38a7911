//! Reading and writing the documents edit trees are applied to.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

const CHECKSUM_PREFIX: &str = "xxh3:";

#[derive(Error, Debug)]
pub enum FileError {
    #[error(
        "checksum mismatch for {}: expected {expected}, found {found}",
        .path.display()
    )]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("malformed checksum '{0}' (expected xxh3:<hex>)")]
    MalformedChecksum(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// xxh3 checksum of a document, formatted as `xxh3:<hex>`.
pub fn checksum(text: &str) -> String {
    format!("{CHECKSUM_PREFIX}{:016x}", xxh3_64(text.as_bytes()))
}

/// Parse an `xxh3:<hex>` checksum into its hash value.
pub fn parse_checksum(value: &str) -> Option<u64> {
    let hex = value.strip_prefix(CHECKSUM_PREFIX)?;
    u64::from_str_radix(hex, 16).ok()
}

/// Check `text` against an expected `xxh3:<hex>` checksum.
pub fn verify_checksum(path: &Path, text: &str, expected: &str) -> Result<(), FileError> {
    let expected_hash =
        parse_checksum(expected).ok_or_else(|| FileError::MalformedChecksum(expected.to_string()))?;
    if xxh3_64(text.as_bytes()) != expected_hash {
        return Err(FileError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            found: checksum(text),
        });
    }
    Ok(())
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or the destination is left untouched.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), FileError> {
    // Same directory keeps the rename on one filesystem
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

/// Read a whole document as UTF-8 text.
pub fn read_document(path: &Path) -> Result<String, FileError> {
    Ok(fs::read_to_string(path)?)
}

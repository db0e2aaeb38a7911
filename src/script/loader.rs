//! Reading edit scripts and building them against a document.

use crate::file::{verify_checksum, FileError};
use crate::script::builder::{BuildError, BuiltTree};
use crate::script::schema::{EditScript, ValidationError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("failed to read edit script {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse edit script{}: {source}", located(.path))]
    Toml {
        path: Option<PathBuf>,
        #[source]
        source: toml_edit::de::Error,
    },

    #[error("invalid edit script{}: {source}", located(.path))]
    Validation {
        path: Option<PathBuf>,
        #[source]
        source: ValidationError,
    },

    #[error("edit script{} was written for a different document", located(.path))]
    Checksum {
        path: Option<PathBuf>,
        #[source]
        source: FileError,
    },

    #[error("edit script{} does not fit a {document_len}-byte document", located(.path))]
    Build {
        path: Option<PathBuf>,
        document_len: usize,
        #[source]
        source: BuildError,
    },
}

fn located(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" ({})", path.display()),
        None => String::new(),
    }
}

fn parse(input: &str, path: Option<&Path>) -> Result<EditScript, ScriptError> {
    let owned = || path.map(Path::to_path_buf);
    let script: EditScript =
        toml_edit::de::from_str(input).map_err(|source| ScriptError::Toml {
            path: owned(),
            source,
        })?;
    script.validate().map_err(|source| ScriptError::Validation {
        path: owned(),
        source,
    })?;
    Ok(script)
}

pub fn load_from_str(input: &str) -> Result<EditScript, ScriptError> {
    parse(input, None)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<EditScript, ScriptError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ScriptError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&contents, Some(path))
}

/// Load the script at `script_path` and build it against `document`.
///
/// When the script carries a checksum, `document` must match it before any
/// tree is built. `document_path` only names the document in errors.
pub fn load_for_document(
    script_path: impl AsRef<Path>,
    document_path: &Path,
    document: &str,
) -> Result<(EditScript, BuiltTree), ScriptError> {
    let script_path = script_path.as_ref();
    let script = load_from_path(script_path)?;

    if let Some(expected) = &script.meta.checksum {
        verify_checksum(document_path, document, expected).map_err(|source| {
            ScriptError::Checksum {
                path: Some(script_path.to_path_buf()),
                source,
            }
        })?;
    }

    let built = script
        .build(document.len())
        .map_err(|source| ScriptError::Build {
            path: Some(script_path.to_path_buf()),
            document_len: document.len(),
            source,
        })?;
    debug!(
        script = %script_path.display(),
        document = %document_path.display(),
        "edit script ready"
    );
    Ok((script, built))
}

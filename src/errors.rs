// Error types for the backing store.
// Parse rejections and policy denials are represented as data, never as
// errors; these variants cover storage I/O and invalid mutation input.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

/// Failure while persisting or restoring the approval config.
///
/// Write failures must reach the caller: a dropped allowlist addition is a
/// security-relevant surprise. Read failures never surface here — an
/// unreadable store falls back to built-in defaults at load time.
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid approval config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("allowlist pattern must not be empty")]
    EmptyPattern,

    #[error("safe-bin name must not be empty")]
    EmptySafeBin,

    #[error("cannot determine config directory")]
    NoConfigDir,
}

impl StoreError {
    pub(crate) fn write(path: &Path, source: std::io::Error) -> Self {
        StoreError::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}

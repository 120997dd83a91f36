//! I/O-boundary errors: malformed config sources and result-log sinks.

use std::path::PathBuf;

use tester_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, #[source] source: std::io::Error },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, #[source] source: std::io::Error },

    #[error("malformed config source {path}: {source}")]
    Malformed { path: PathBuf, #[source] source: serde_json::Error },

    #[error("config package '{name}' not found under {root}")]
    PackageNotFound { name: String, root: PathBuf },

    #[error(transparent)]
    Core(#[from] CoreError),
}

//! Domain-specific errors.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to load one sourcemap file or the sourcemap directory.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read sourcemap directory {path}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read sourcemap {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid sourcemap JSON in {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(
        "malformed sourcemap {path}: {sources} sources but {contents} sourcesContent entries"
    )]
    MalformedSourcemap {
        path: PathBuf,
        sources: usize,
        contents: usize,
    },
    #[error("failed to decode mappings in {path}: {message}")]
    Decode { path: PathBuf, message: String },
}

impl LoadError {
    /// Path of the file or directory that failed.
    pub fn path(&self) -> &std::path::Path {
        match self {
            LoadError::ReadDir { path, .. }
            | LoadError::Read { path, .. }
            | LoadError::Json { path, .. }
            | LoadError::MalformedSourcemap { path, .. }
            | LoadError::Decode { path, .. } => path,
        }
    }
}

/// Misuse of the navigation engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("tool is already bound to a dataset")]
    AlreadyBound,
}

//! Error types shared by the pipeline stages.
//!
//! Two severities exist. [`PipelineError`] is fatal and is only produced
//! before any file is touched. [`FileFixError`] describes a single item that
//! could not be processed; stages record it and move on.

use crate::config::ConfigError;
use std::io;
use std::path::{Path, PathBuf};

/// A failure affecting one file or folder during a stage.
#[derive(Debug)]
pub enum FileFixError {
    /// The entry disappeared between listing and acting on it.
    NotFound { path: PathBuf },
    /// Failed to create a destination folder.
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// Failed to move a file into its destination folder.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: io::Error,
    },
    /// Failed to read a file while computing its digest.
    HashFailed { path: PathBuf, source: io::Error },
    /// Failed to delete a duplicate file or an empty folder.
    RemoveFailed { path: PathBuf, source: io::Error },
    /// Failed to list a directory.
    ListFailed { path: PathBuf, source: io::Error },
}

impl FileFixError {
    pub(crate) fn directory_creation(path: &Path, err: io::Error) -> Self {
        Self::DirectoryCreationFailed {
            path: path.to_path_buf(),
            source: err,
        }
    }

    /// A move whose source is gone is a listing race, not a move failure.
    pub(crate) fn file_move(source: &Path, destination: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound && !source.exists() {
            return Self::NotFound {
                path: source.to_path_buf(),
            };
        }
        Self::FileMoveFailure {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            source_error: err,
        }
    }

    pub(crate) fn hash(path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            return Self::NotFound {
                path: path.to_path_buf(),
            };
        }
        Self::HashFailed {
            path: path.to_path_buf(),
            source: err,
        }
    }

    pub(crate) fn remove(path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            return Self::NotFound {
                path: path.to_path_buf(),
            };
        }
        Self::RemoveFailed {
            path: path.to_path_buf(),
            source: err,
        }
    }

    pub(crate) fn list(path: &Path, err: io::Error) -> Self {
        Self::ListFailed {
            path: path.to_path_buf(),
            source: err,
        }
    }

    /// Returns true if the entry vanished before it could be processed.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The path this error is about.
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound { path }
            | Self::DirectoryCreationFailed { path, .. }
            | Self::HashFailed { path, .. }
            | Self::RemoveFailed { path, .. }
            | Self::ListFailed { path, .. } => path,
            Self::FileMoveFailure { source, .. } => source,
        }
    }
}

impl std::fmt::Display for FileFixError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { path } => {
                write!(f, "{} disappeared before it could be processed", path.display())
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(f, "Failed to create directory {}: {}", path.display(), source)
            }
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::HashFailed { path, source } => {
                write!(f, "Failed to hash {}: {}", path.display(), source)
            }
            Self::RemoveFailed { path, source } => {
                write!(f, "Failed to remove {}: {}", path.display(), source)
            }
            Self::ListFailed { path, source } => {
                write!(f, "Failed to list {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for FileFixError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotFound { .. } => None,
            Self::DirectoryCreationFailed { source, .. }
            | Self::HashFailed { source, .. }
            | Self::RemoveFailed { source, .. }
            | Self::ListFailed { source, .. } => Some(source),
            Self::FileMoveFailure { source_error, .. } => Some(source_error),
        }
    }
}

/// Errors that stop a run before it mutates anything.
#[derive(Debug)]
pub enum PipelineError {
    /// The configuration could not be loaded or is invalid.
    Config(ConfigError),
    /// The worker pool could not be built.
    ThreadPool(String),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{}", e),
            Self::ThreadPool(reason) => write!(f, "Failed to start worker pool: {}", reason),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::ThreadPool(_) => None,
        }
    }
}

impl From<ConfigError> for PipelineError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

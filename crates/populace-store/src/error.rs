//! Error types for the store crate.
//!
//! [`StoreError`] is what opening a store or exporter can fail with. Once a
//! run is underway, failures cross the orchestrator boundary as
//! [`PersistError`] or [`ExportError`].

use std::path::PathBuf;

use populace_core::{ExportError, PersistError};

/// Errors that can occur in the store and exporter.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A file or directory operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The path being accessed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<StoreError> for PersistError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io { source, .. } => Self::Io { source },
            StoreError::Serialization(source) => Self::Encode { source },
        }
    }
}

impl From<StoreError> for ExportError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io { source, .. } => Self::Io { source },
            StoreError::Serialization(source) => Self::Encode { source },
        }
    }
}
